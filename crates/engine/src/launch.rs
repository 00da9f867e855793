//! Launching a workflow: selecting a version and launch plan, filling inputs,
//! and submitting the execution request.

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use flytedeck_api::AdminApi;
use flytedeck_types::{
    ExecutionCreateRequest, ExecutionSpec, Identifier, LaunchPlan, LiteralMap, NamedEntityIdentifier, TaskTemplate, Workflow,
    WorkflowExecutionIdentifier,
};
use tracing::{info, warn};

use crate::{
    cache::EntityCache,
    fetch::{Fetchable, MultiFetchableState, multi_fetchable_state},
    inputs::{InputValue, InputValueMap, ParsedInput, ValidationErrors, parse_inputs, validate_inputs},
    sources::{launch_plans_fetchable, workflow_fetchable, workflow_versions_fetchable},
};

/// Data the launch form loads before inputs can be shown.
pub struct LaunchFormSources {
    pub workflow_versions: Fetchable<NamedEntityIdentifier, Vec<Workflow>>,
    pub launch_plans: Fetchable<Option<Identifier>, Vec<LaunchPlan>>,
    pub workflow: Fetchable<Option<Identifier>, Workflow>,
}

impl LaunchFormSources {
    /// Start loading versions of `workflow`. Launch plans and the workflow
    /// closure load once a version is selected.
    pub fn new(api: Arc<dyn AdminApi>, task_cache: EntityCache<TaskTemplate>, workflow: NamedEntityIdentifier) -> Self {
        Self {
            workflow_versions: workflow_versions_fetchable(Arc::clone(&api), workflow),
            launch_plans: launch_plans_fetchable(Arc::clone(&api), None),
            workflow: workflow_fetchable(api, task_cache, None),
        }
    }

    pub fn select_workflow(&self, id: Identifier) {
        info!(workflow = %id, "launch workflow version selected");
        self.launch_plans.set_key(Some(id.clone()));
        self.workflow.set_key(Some(id));
    }

    pub fn selected_workflow(&self) -> Option<Identifier> {
        self.workflow.key()
    }

    /// Newest loaded version, if any.
    pub fn latest_workflow_version(&self) -> Option<Identifier> {
        self.workflow_versions
            .inspect(|state| state.value.first().map(|workflow| workflow.id.clone()))
    }

    /// The launch plan sharing the workflow's name, else the first one loaded.
    pub fn preferred_launch_plan(&self) -> Option<LaunchPlan> {
        let workflow_name = self.selected_workflow().map(|id| id.name);
        self.launch_plans.inspect(|state| {
            state
                .value
                .iter()
                .find(|launch_plan| Some(&launch_plan.id.name) == workflow_name.as_ref())
                .or_else(|| state.value.first())
                .cloned()
        })
    }

    pub fn workflow_options_loading_state(&self) -> MultiFetchableState {
        multi_fetchable_state(&[&self.workflow_versions])
    }

    pub fn launch_plan_options_loading_state(&self) -> MultiFetchableState {
        multi_fetchable_state(&[&self.workflow_versions, &self.launch_plans])
    }

    pub fn inputs_loading_state(&self) -> MultiFetchableState {
        multi_fetchable_state(&[&self.workflow, &self.launch_plans])
    }
}

/// Entered values for a selected launch plan.
#[derive(Debug, Clone)]
pub struct LaunchForm {
    launch_plan: LaunchPlan,
    inputs: Vec<ParsedInput>,
    values: InputValueMap,
}

impl LaunchForm {
    pub fn new(launch_plan: LaunchPlan) -> Self {
        let inputs = parse_inputs(&launch_plan.closure.expected_inputs);
        Self {
            launch_plan,
            inputs,
            values: InputValueMap::new(),
        }
    }

    pub fn launch_plan(&self) -> &LaunchPlan {
        &self.launch_plan
    }

    pub fn inputs(&self) -> &[ParsedInput] {
        &self.inputs
    }

    pub fn value(&self, name: &str) -> Option<&InputValue> {
        self.values.get(name)
    }

    /// Record a value for the named input.
    pub fn set_value(&mut self, name: &str, value: impl Into<InputValue>) -> Result<()> {
        if !self.inputs.iter().any(|input| input.name == name) {
            bail!("launch plan {} has no input named '{name}'", self.launch_plan.id);
        }
        self.values.insert(name.to_string(), value.into());
        Ok(())
    }

    pub fn validate(&self) -> Result<LiteralMap, ValidationErrors> {
        validate_inputs(&self.inputs, &self.values)
    }

    /// Build the create request; `name` is generated server-side when absent.
    pub fn execution_request(&self, name: Option<String>) -> Result<ExecutionCreateRequest, ValidationErrors> {
        let literals = self.validate()?;
        Ok(ExecutionCreateRequest {
            project: self.launch_plan.id.project.clone(),
            domain: self.launch_plan.id.domain.clone(),
            name,
            spec: ExecutionSpec {
                launch_plan: self.launch_plan.id.clone(),
                inputs: literals.clone(),
            },
            inputs: literals,
        })
    }

    /// Validate and submit, returning the new execution's identifier.
    pub async fn submit(&self, api: &dyn AdminApi, name: Option<String>) -> Result<WorkflowExecutionIdentifier> {
        let request = self.execution_request(name).inspect_err(|errors| {
            warn!(launch_plan = %self.launch_plan.id, error_count = errors.len(), "launch rejected by input validation");
        })?;
        let execution_id = api
            .create_execution(&request)
            .await
            .with_context(|| format!("launch {}", self.launch_plan.id))?;
        info!(launch_plan = %self.launch_plan.id, execution = %execution_id, "execution launched");
        Ok(execution_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flytedeck_types::{Literal, LiteralType, Parameter, ParameterMap, ResourceType, SimpleType, Variable};
    use indexmap::IndexMap;

    fn launch_plan() -> LaunchPlan {
        let mut parameters = IndexMap::new();
        parameters.insert(
            "count".to_string(),
            Parameter {
                var: Variable {
                    r#type: Some(LiteralType::Simple(SimpleType::Integer)),
                    description: None,
                },
                default: None,
            },
        );
        parameters.insert(
            "greeting".to_string(),
            Parameter {
                var: Variable {
                    r#type: Some(LiteralType::Simple(SimpleType::String)),
                    description: None,
                },
                default: Some(Literal::string("hello")),
            },
        );
        let mut launch_plan = LaunchPlan {
            id: Identifier::new(ResourceType::LaunchPlan, "flyte", "development", "wf", "v1"),
            ..Default::default()
        };
        launch_plan.closure.expected_inputs = ParameterMap { parameters };
        launch_plan
    }

    #[test]
    fn rejects_unknown_input_names() {
        let mut form = LaunchForm::new(launch_plan());
        assert!(form.set_value("missing", "1").is_err());
        assert!(form.set_value("count", "1").is_ok());
    }

    #[test]
    fn request_combines_entered_and_default_values() {
        let mut form = LaunchForm::new(launch_plan());
        assert_eq!(form.inputs().len(), 2);
        form.set_value("count", "5").expect("known input");

        let request = form.execution_request(Some("run-1".into())).expect("valid form");
        assert_eq!(request.project, "flyte");
        assert_eq!(request.name.as_deref(), Some("run-1"));
        assert_eq!(request.inputs.literals.get("count").and_then(Literal::as_integer), Some(5));
        assert_eq!(request.inputs.literals.get("greeting"), Some(&Literal::string("hello")));
        assert_eq!(request.spec.inputs, request.inputs);
    }

    #[test]
    fn request_requires_values_without_defaults() {
        let form = LaunchForm::new(launch_plan());
        let errors = form.execution_request(None).expect_err("count is required");
        assert_eq!(errors.get("count"), Some(crate::inputs::REQUIRED_MESSAGE));
        assert!(errors.get("greeting").is_none());
    }
}
