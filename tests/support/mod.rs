//! In-memory twin service shared by the engine and pipeline tests.
#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use tokio::sync::mpsc;
use twin_migrate::twins::{InstanceStream, ServiceError, TwinInstance, TwinService};

/// Every call the fake receives, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateModels(Vec<String>),
    Query(String),
    PatchStarted { instance_id: String, model_id: String },
    Patched { instance_id: String, model_id: String },
}

#[derive(Default)]
struct State {
    /// Instance id and current binding, in query order.
    twins: Vec<(String, String)>,
    publish_error: Option<ServiceError>,
    failing_queries: HashMap<String, ServiceError>,
    hanging_queries: HashSet<String>,
    failing_patches: HashSet<String>,
    hanging_patches: HashSet<String>,
    calls: Vec<Call>,
}

#[derive(Default)]
pub struct FakeTwinService {
    state: Mutex<State>,
    events: Mutex<Option<mpsc::UnboundedSender<Call>>>,
}

impl FakeTwinService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_twin(self, instance_id: &str, model_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .twins
            .push((instance_id.to_string(), model_id.to_string()));
        self
    }

    pub fn failing_publish(self, error: ServiceError) -> Self {
        self.state.lock().unwrap().publish_error = Some(error);
        self
    }

    pub fn failing_query(self, model_id: &str, error: ServiceError) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_queries
            .insert(model_id.to_string(), error);
        self
    }

    /// The query for `model_id` never yields its first page.
    pub fn hanging_query(self, model_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .hanging_queries
            .insert(model_id.to_string());
        self
    }

    pub fn failing_patch(self, instance_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_patches
            .insert(instance_id.to_string());
        self
    }

    /// The patch for `instance_id` never receives a response.
    pub fn hanging_patch(self, instance_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .hanging_patches
            .insert(instance_id.to_string());
        self
    }

    /// Stream of calls as they happen, for tests that need to act mid-run.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Call> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.events.lock().unwrap() = Some(tx);
        rx
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Query(model_id) => Some(model_id),
                _ => None,
            })
            .collect()
    }

    /// Completed patches as `(instance_id, model_id)`.
    pub fn patches(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Patched {
                    instance_id,
                    model_id,
                } => Some((instance_id, model_id)),
                _ => None,
            })
            .collect()
    }

    pub fn binding(&self, instance_id: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .twins
            .iter()
            .find(|(id, _)| id == instance_id)
            .map(|(_, model)| model.clone())
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call.clone());
        if let Some(tx) = self.events.lock().unwrap().as_ref() {
            let _ = tx.send(call);
        }
    }
}

#[async_trait]
impl TwinService for FakeTwinService {
    async fn create_models(&self, documents: &[Value]) -> Result<(), ServiceError> {
        let ids = documents
            .iter()
            .filter_map(|doc| doc.get("@id").and_then(Value::as_str))
            .map(str::to_string)
            .collect();
        self.record(Call::CreateModels(ids));
        match self.state.lock().unwrap().publish_error.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn query_instances_of_model<'a>(&'a self, model_id: &'a str) -> InstanceStream<'a> {
        self.record(Call::Query(model_id.to_string()));
        let state = self.state.lock().unwrap();
        if state.hanging_queries.contains(model_id) {
            return stream::pending().boxed();
        }
        if let Some(error) = state.failing_queries.get(model_id) {
            return stream::iter(vec![Err(error.clone())]).boxed();
        }
        let instances: Vec<Result<TwinInstance, ServiceError>> = state
            .twins
            .iter()
            .filter(|(_, bound)| bound == model_id)
            .map(|(id, bound)| {
                Ok(TwinInstance {
                    instance_id: id.clone(),
                    current_model_id: bound.clone(),
                })
            })
            .collect();
        stream::iter(instances).boxed()
    }

    async fn patch_instance_model_binding(
        &self,
        instance_id: &str,
        model_id: &str,
    ) -> Result<(), ServiceError> {
        self.record(Call::PatchStarted {
            instance_id: instance_id.to_string(),
            model_id: model_id.to_string(),
        });
        let (hangs, fails) = {
            let state = self.state.lock().unwrap();
            (
                state.hanging_patches.contains(instance_id),
                state.failing_patches.contains(instance_id),
            )
        };
        if hangs {
            std::future::pending::<()>().await;
        }
        if fails {
            return Err(ServiceError::Status {
                status: 500,
                message: format!("cannot patch {}", instance_id),
            });
        }
        {
            let mut state = self.state.lock().unwrap();
            match state.twins.iter_mut().find(|(id, _)| id == instance_id) {
                Some((_, bound)) => *bound = model_id.to_string(),
                None => {
                    return Err(ServiceError::Status {
                        status: 404,
                        message: format!("twin {} not found", instance_id),
                    })
                }
            }
        }
        self.record(Call::Patched {
            instance_id: instance_id.to_string(),
            model_id: model_id.to_string(),
        });
        Ok(())
    }
}
