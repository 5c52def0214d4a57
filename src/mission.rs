/*!
 * Mission autonomy client: missions, tasks and schedulers
 */

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tonic::Status;

use crate::error::Result;
use crate::models::{
    Envelope, MissionDefinition, MissionResponse, SchedulerDefinition, SchedulerResponse,
    TaskDefinition, TaskResponse,
};
use crate::service::CallContext;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MissionOp {
    Create { mission: MissionDefinition },
    Update { mission_id: String, mission: MissionDefinition },
    Get { mission_id: String },
    Delete { mission_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TaskOp {
    Create { task: TaskDefinition },
    Update { task_id: String, task: TaskDefinition },
    Get { task_id: String },
    GetByFlightId { flight_id: String },
    Delete { task_id: String },
    Start { task_id: String },
    Stop { task_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SchedulerOp {
    Create { scheduler: SchedulerDefinition },
    Update { scheduler_id: String, scheduler: SchedulerDefinition },
    Get { scheduler_id: String },
    Delete { scheduler_id: String },
}

/// Transport to the mission autonomy service
#[async_trait]
pub trait MissionTransport: Send + Sync {
    async fn mission(
        &self,
        request: Envelope<MissionOp>,
    ) -> std::result::Result<MissionResponse, Status>;

    async fn task(&self, request: Envelope<TaskOp>) -> std::result::Result<TaskResponse, Status>;

    async fn scheduler(
        &self,
        request: Envelope<SchedulerOp>,
    ) -> std::result::Result<SchedulerResponse, Status>;
}

/// Mission autonomy service client
#[derive(Clone)]
pub struct MissionAutonomy {
    transport: Arc<dyn MissionTransport>,
    ctx: CallContext,
}

impl MissionAutonomy {
    pub fn new(transport: Arc<dyn MissionTransport>, ctx: CallContext) -> Self {
        Self { transport, ctx }
    }

    pub fn context(&self) -> &CallContext {
        &self.ctx
    }

    async fn mission_op(&self, operation: &'static str, op: MissionOp) -> Result<MissionResponse> {
        let transport = &self.transport;
        self.ctx
            .unary(operation, Envelope::unscoped(op), |req| transport.mission(req))
            .await
    }

    async fn task_op(&self, operation: &'static str, op: TaskOp) -> Result<TaskResponse> {
        let transport = &self.transport;
        self.ctx
            .unary(operation, Envelope::unscoped(op), |req| transport.task(req))
            .await
    }

    async fn scheduler_op(
        &self,
        operation: &'static str,
        op: SchedulerOp,
    ) -> Result<SchedulerResponse> {
        let transport = &self.transport;
        self.ctx
            .unary(operation, Envelope::unscoped(op), |req| transport.scheduler(req))
            .await
    }

    // Missions

    pub async fn create_mission(&self, mission: MissionDefinition) -> Result<MissionResponse> {
        self.mission_op("create_mission", MissionOp::Create { mission })
            .await
    }

    pub async fn update_mission(
        &self,
        mission_id: &str,
        mission: MissionDefinition,
    ) -> Result<MissionResponse> {
        self.mission_op(
            "update_mission",
            MissionOp::Update {
                mission_id: mission_id.to_string(),
                mission,
            },
        )
        .await
    }

    pub async fn get_mission(&self, mission_id: &str) -> Result<MissionResponse> {
        self.mission_op(
            "get_mission",
            MissionOp::Get {
                mission_id: mission_id.to_string(),
            },
        )
        .await
    }

    pub async fn delete_mission(&self, mission_id: &str) -> Result<MissionResponse> {
        self.mission_op(
            "delete_mission",
            MissionOp::Delete {
                mission_id: mission_id.to_string(),
            },
        )
        .await
    }

    // Tasks

    pub async fn create_task(&self, task: TaskDefinition) -> Result<TaskResponse> {
        self.task_op("create_task", TaskOp::Create { task }).await
    }

    pub async fn update_task(&self, task_id: &str, task: TaskDefinition) -> Result<TaskResponse> {
        self.task_op(
            "update_task",
            TaskOp::Update {
                task_id: task_id.to_string(),
                task,
            },
        )
        .await
    }

    pub async fn get_task(&self, task_id: &str) -> Result<TaskResponse> {
        self.task_op(
            "get_task",
            TaskOp::Get {
                task_id: task_id.to_string(),
            },
        )
        .await
    }

    /// Look up the task a flight was started for
    pub async fn get_task_by_flight_id(&self, flight_id: &str) -> Result<TaskResponse> {
        self.task_op(
            "get_task_by_flight_id",
            TaskOp::GetByFlightId {
                flight_id: flight_id.to_string(),
            },
        )
        .await
    }

    pub async fn delete_task(&self, task_id: &str) -> Result<TaskResponse> {
        self.task_op(
            "delete_task",
            TaskOp::Delete {
                task_id: task_id.to_string(),
            },
        )
        .await
    }

    pub async fn start_task(&self, task_id: &str) -> Result<TaskResponse> {
        self.task_op(
            "start_task",
            TaskOp::Start {
                task_id: task_id.to_string(),
            },
        )
        .await
    }

    pub async fn stop_task(&self, task_id: &str) -> Result<TaskResponse> {
        self.task_op(
            "stop_task",
            TaskOp::Stop {
                task_id: task_id.to_string(),
            },
        )
        .await
    }

    // Schedulers

    pub async fn create_scheduler(
        &self,
        scheduler: SchedulerDefinition,
    ) -> Result<SchedulerResponse> {
        self.scheduler_op("create_scheduler", SchedulerOp::Create { scheduler })
            .await
    }

    pub async fn update_scheduler(
        &self,
        scheduler_id: &str,
        scheduler: SchedulerDefinition,
    ) -> Result<SchedulerResponse> {
        self.scheduler_op(
            "update_scheduler",
            SchedulerOp::Update {
                scheduler_id: scheduler_id.to_string(),
                scheduler,
            },
        )
        .await
    }

    pub async fn get_scheduler(&self, scheduler_id: &str) -> Result<SchedulerResponse> {
        self.scheduler_op(
            "get_scheduler",
            SchedulerOp::Get {
                scheduler_id: scheduler_id.to_string(),
            },
        )
        .await
    }

    pub async fn delete_scheduler(&self, scheduler_id: &str) -> Result<SchedulerResponse> {
        self.scheduler_op(
            "delete_scheduler",
            SchedulerOp::Delete {
                scheduler_id: scheduler_id.to_string(),
            },
        )
        .await
    }
}

impl std::fmt::Debug for MissionAutonomy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MissionAutonomy")
            .field("ctx", &self.ctx)
            .finish_non_exhaustive()
    }
}
