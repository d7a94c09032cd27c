//! Composition root: owns the immutable specification values, re-invokes
//! the pure derivation pipeline on change, and pushes results to view
//! subscribers. Unidirectional: views never mutate shared state, they
//! submit updates here.

use serde::{Deserialize, Serialize};

use triptych_common::dataset::Dataset;
use triptych_common::types::ViewKind;
use triptych_sonify::config::SonifyConfig;
use triptych_sonify::timeline::{build_timeline, Timeline};
use triptych_spec::compile::{compile, structure, StructureSpec};
use triptych_spec::defaults::default_spec;
use triptych_spec::field::FieldDef;
use triptych_spec::infer::infer_measure_type;
use triptych_spec::predicate::Predicate;
use triptych_spec::unit::MultimodalSpec;

use crate::error::TriptychAppError;

/// A selection change tagged with the view that produced it. The source
/// view ignores the resulting notification, which breaks feedback loops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionUpdate {
    pub source: ViewKind,
    pub predicate: Option<Predicate>,
}

/// Everything the consuming views need, recomputed as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedOutputs {
    /// Renderable chart spec; `None` means nothing to render.
    pub render: Option<serde_json::Value>,
    /// Navigable textual structure.
    pub structure: StructureSpec,
    /// One timeline per audio unit, in declaration order.
    pub timelines: Vec<(String, Timeline)>,
}

/// A consuming view registered with the app.
pub trait ViewSubscriber {
    fn kind(&self) -> ViewKind;
    fn update(&mut self, outputs: &DerivedOutputs, selection: Option<&Predicate>);
}

pub struct TriptychApp {
    spec: MultimodalSpec,
    dataset: Dataset,
    selection: Option<SelectionUpdate>,
    config: SonifyConfig,
    outputs: DerivedOutputs,
    subscribers: Vec<Box<dyn ViewSubscriber>>,
}

impl TriptychApp {
    pub fn new(spec: MultimodalSpec, dataset: Dataset) -> Result<Self, TriptychAppError> {
        let outputs = derive_outputs(&spec, &dataset, None, &SonifyConfig::default())?;
        Ok(Self {
            spec,
            dataset,
            selection: None,
            config: SonifyConfig::default(),
            outputs,
            subscribers: Vec::new(),
        })
    }

    /// Bootstrap from a freshly-loaded dataset: infer a field definition
    /// per column, then generate the default specification. `None` when
    /// the dataset supports no default (e.g. it is empty).
    pub fn from_dataset(
        name: impl Into<String>,
        dataset: Dataset,
    ) -> Result<Option<Self>, TriptychAppError> {
        let fields: Vec<FieldDef> = dataset
            .field_names()
            .into_iter()
            .map(|column| {
                let measure = infer_measure_type(&dataset, &column);
                FieldDef::new(column, measure)
            })
            .collect();

        match default_spec(name, fields, &dataset) {
            Some(spec) => Ok(Some(Self::new(spec, dataset)?)),
            None => Ok(None),
        }
    }

    pub fn spec(&self) -> &MultimodalSpec {
        &self.spec
    }

    pub fn outputs(&self) -> &DerivedOutputs {
        &self.outputs
    }

    pub fn selection(&self) -> Option<&Predicate> {
        self.selection.as_ref().and_then(|s| s.predicate.as_ref())
    }

    pub fn subscribe(&mut self, subscriber: Box<dyn ViewSubscriber>) {
        self.subscribers.push(subscriber);
    }

    /// Replace the specification and push fresh outputs to every view.
    pub fn set_spec(&mut self, spec: MultimodalSpec) -> Result<(), TriptychAppError> {
        self.spec = spec;
        self.recompute(None)
    }

    /// Replace the dataset (e.g. a new file load); any selection against
    /// the old data is cleared.
    pub fn set_dataset(&mut self, dataset: Dataset) -> Result<(), TriptychAppError> {
        self.dataset = dataset;
        self.selection = None;
        self.recompute(None)
    }

    /// Apply a selection change from one view.
    ///
    /// All other views are notified; the originating view is skipped so
    /// its own update does not echo back into it.
    pub fn update_selection(&mut self, update: SelectionUpdate) -> Result<(), TriptychAppError> {
        let source = update.source;
        self.selection = Some(update);
        self.recompute(Some(source))
    }

    fn recompute(&mut self, skip: Option<ViewKind>) -> Result<(), TriptychAppError> {
        let predicate = self.selection.as_ref().and_then(|s| s.predicate.as_ref());
        let outputs = derive_outputs(&self.spec, &self.dataset, predicate, &self.config)?;

        // Unchanged outputs mean consuming views have nothing to do; in
        // particular a playing sonification must not restart.
        if outputs == self.outputs && skip.is_none() {
            tracing::debug!("derived outputs unchanged, skipping notification");
            return Ok(());
        }
        self.outputs = outputs;

        let predicate = self
            .selection
            .as_ref()
            .and_then(|s| s.predicate.clone());
        for subscriber in &mut self.subscribers {
            if Some(subscriber.kind()) == skip {
                continue;
            }
            subscriber.update(&self.outputs, predicate.as_ref());
        }
        Ok(())
    }
}

/// The pure derivation pipeline: one call produces everything the three
/// views consume, deterministically.
pub fn derive_outputs(
    spec: &MultimodalSpec,
    dataset: &Dataset,
    selection: Option<&Predicate>,
    config: &SonifyConfig,
) -> Result<DerivedOutputs, TriptychAppError> {
    let render = compile(spec, dataset);
    let structure = structure(spec);
    let mut timelines = Vec::with_capacity(spec.audio.len());
    for unit in &spec.audio {
        let timeline = build_timeline(spec, unit, dataset, selection, config)?;
        timelines.push((unit.name.clone(), timeline));
    }
    Ok(DerivedOutputs {
        render,
        structure,
        timelines,
    })
}
