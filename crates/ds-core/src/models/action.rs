use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::desire::EnvironmentVariable;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nofile: Option<u64>,
}

impl ResourceLimits {
    pub fn nofile(limit: u64) -> Self {
        Self {
            nofile: Some(limit),
        }
    }
}

/// Fetch an artifact onto the cell before the instance starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadAction {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub cache_key: String,
    pub user: String,
}

/// Execute a process inside the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunAction {
    pub path: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: Vec<EnvironmentVariable>,
    #[serde(default)]
    pub resource_limits: ResourceLimits,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_source: Option<String>,
}

/// A node of the program a cell executes to realize a run specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Children run one after another; the first failure stops the group.
    Serial(Vec<Action>),
    /// Children run concurrently; the group waits for all of them.
    Parallel(Vec<Action>),
    /// Children run concurrently; when any exits, the rest are torn down.
    Codependent(Vec<Action>),
    Timeout {
        action: Box<Action>,
        timeout: Duration,
    },
    Download(DownloadAction),
    Run(RunAction),
}

impl Action {
    pub fn timeout(action: Action, timeout: Duration) -> Self {
        Action::Timeout {
            action: Box::new(action),
            timeout,
        }
    }

    /// Depth-first list of every download step in the tree.
    pub fn downloads(&self) -> Vec<&DownloadAction> {
        let mut found = Vec::new();
        self.visit(&mut |action| {
            if let Action::Download(download) = action {
                found.push(download);
            }
        });
        found
    }

    /// Depth-first list of every run step in the tree.
    pub fn run_steps(&self) -> Vec<&RunAction> {
        let mut found = Vec::new();
        self.visit(&mut |action| {
            if let Action::Run(run) = action {
                found.push(run);
            }
        });
        found
    }

    fn visit<'a>(&'a self, f: &mut dyn FnMut(&'a Action)) {
        f(self);
        match self {
            Action::Serial(children) | Action::Parallel(children) | Action::Codependent(children) => {
                for child in children {
                    child.visit(f);
                }
            }
            Action::Timeout { action, .. } => action.visit(f),
            Action::Download(_) | Action::Run(_) => {}
        }
    }
}
