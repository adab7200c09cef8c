//! Scene plans
//!
//! A plan is the JSON form of a whole scene: its actors with their scripts
//! and expression tables, the choreography, and the engine configuration.

use std::collections::HashSet;
use std::path::Path;

use marionette_core::{ActorId, MarionetteError, MarionetteResult, SceneId};
use marionette_visual::ExpressionTable;
use marionette_voice::PlaybackService;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::scene::Scene;
use crate::script::ActorScript;
use crate::sequencer::Choreography;

/// One actor of a plan
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActorPlan {
    pub id: ActorId,
    pub name: String,
    /// Defaults to the conventional table named after the actor
    #[serde(default)]
    pub expressions: Option<ExpressionTable>,
    pub script: ActorScript,
}

impl ActorPlan {
    pub fn expression_table(&self) -> ExpressionTable {
        self.expressions
            .clone()
            .unwrap_or_else(|| ExpressionTable::conventional(&self.name))
    }
}

fn full_volume() -> f32 {
    1.0
}

/// Serializable description of a scene
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenePlan {
    #[serde(default)]
    pub scene: SceneId,
    #[serde(default)]
    pub config: EngineConfig,
    pub actors: Vec<ActorPlan>,
    #[serde(default)]
    pub choreography: Choreography,
    #[serde(default = "full_volume")]
    pub volume: f32,
}

impl ScenePlan {
    pub fn from_json(json: &str) -> MarionetteResult<Self> {
        serde_json::from_str(json).map_err(|e| MarionetteError::Plan(e.to_string()))
    }

    pub fn to_json(&self) -> MarionetteResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| MarionetteError::Plan(e.to_string()))
    }

    /// Read and parse a plan file
    pub fn load(path: impl AsRef<Path>) -> MarionetteResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| MarionetteError::Plan(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    /// Check scripts, expression tables and choreography without building
    pub fn validate(&self) -> MarionetteResult<()> {
        if self.actors.is_empty() {
            return Err(MarionetteError::Plan("plan has no actors".to_string()));
        }
        self.config.validate()?;
        let mut ids = HashSet::new();
        for actor in &self.actors {
            if !ids.insert(actor.id) {
                return Err(MarionetteError::DuplicateActor(actor.id));
            }
            actor.script.validate(actor.id, &actor.expression_table())?;
        }
        self.choreography.validate(&ids)
    }

    /// Build a scene playing through `playback`
    pub fn build(&self, playback: impl PlaybackService + 'static) -> MarionetteResult<Scene> {
        self.validate()?;
        let mut builder = Scene::builder(self.scene)
            .config(self.config.clone())
            .choreography(self.choreography.clone())
            .playback(playback)
            .volume(self.volume);
        for actor in &self.actors {
            builder = builder.actor(
                actor.id,
                actor.name.clone(),
                actor.script.clone(),
                actor.expression_table(),
            );
        }
        builder.build()
    }

    pub fn actor_ids(&self) -> impl Iterator<Item = ActorId> + '_ {
        self.actors.iter().map(|a| a.id)
    }
}
