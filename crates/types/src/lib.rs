//! Strongly typed domain models shared across the API client, engine, and CLI.
//!
//! The models mirror the JSON surface of the workflow control plane ("admin")
//! gateway. Records that carry a `closure.phase` expose terminal predicates so
//! the engine can decide when polling may stop.

pub mod common;
pub mod execution;
pub mod identifier;
pub mod launch_plan;
pub mod literal;
pub mod workflow;

pub use common::{PaginatedEntities, RequestConfig, Sort, SortDirection, limits, sort_fields};
pub use execution::{
    Execution, ExecutionClosure, ExecutionCreateRequest, ExecutionData, ExecutionError, ExecutionSpec, ExecutionTerminateRequest,
    NodeExecution, NodeExecutionClosure, NodeExecutionPhase, TaskExecution, TaskExecutionClosure, TaskExecutionPhase, UrlBlob,
    WorkflowExecutionPhase,
};
pub use identifier::{
    Identifier, IdentifierScope, NamedEntityIdentifier, NodeExecutionIdentifier, ResourceType, TaskExecutionIdentifier,
    WorkflowExecutionIdentifier,
};
pub use launch_plan::{LaunchPlan, LaunchPlanClosure, LaunchPlanSpec, LaunchPlanState};
pub use literal::{
    BlobDimensionality, BlobType, Literal, LiteralMap, LiteralType, Parameter, ParameterMap, Primitive, Scalar, SchemaType, SimpleType,
    Variable,
};
pub use workflow::{CompiledTask, CompiledWorkflowClosure, TaskTemplate, TypedInterface, VariableMap, Workflow, WorkflowClosure};
