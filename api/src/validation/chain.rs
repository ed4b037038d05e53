//! Ordered composition of checkers for one route.

use super::checks::{check_enum, check_numeric_params, check_required, check_types};
use super::context::{Pass, RequestContext, ValidatedEntities};
use super::entity::{check_contact_belongs_to_client, check_exists, EntityLookup};
use super::outcome::ValidationError;
use super::spec::ValidationSpec;

impl ValidationSpec {
    /// Run this checker against one request
    pub async fn check(
        &self,
        ctx: &RequestContext,
        lookup: &dyn EntityLookup,
    ) -> Result<Pass, ValidationError> {
        match self {
            ValidationSpec::RequiredFields(paths) => Ok(check_required(paths, ctx)?),
            ValidationSpec::TypeMap(types) => Ok(check_types(types, ctx)?),
            ValidationSpec::Enum { field, allowed } => Ok(check_enum(field, allowed, ctx)?),
            ValidationSpec::NumericParams(params) => Ok(check_numeric_params(params, ctx)?),
            ValidationSpec::EntityExists { kind, source } => {
                check_exists(*kind, source, ctx, lookup).await
            }
            ValidationSpec::ContactBelongsToClient { contact, client } => {
                check_contact_belongs_to_client(contact, client, ctx, lookup).await
            }
        }
    }
}

/// Checkers in registration order; the first failure ends the run
#[derive(Debug, Clone, Default)]
pub struct ValidationChain {
    specs: Vec<ValidationSpec>,
}

impl ValidationChain {
    pub fn new() -> Self {
        Self { specs: Vec::new() }
    }

    pub fn with(mut self, spec: ValidationSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn specs(&self) -> &[ValidationSpec] {
        &self.specs
    }

    /// Run every checker in order and collect what they attach.
    ///
    /// Checkers after a failing one are never invoked.
    pub async fn run(
        &self,
        ctx: &RequestContext,
        lookup: &dyn EntityLookup,
    ) -> Result<ValidatedEntities, ValidationError> {
        let mut entities = ValidatedEntities::default();

        for spec in &self.specs {
            match spec.check(ctx, lookup).await {
                Ok(Pass::Proceed) => {}
                Ok(Pass::Attach(entity)) => {
                    tracing::debug!(
                        entity = entity.kind().label(),
                        id = entity.id(),
                        key = entity.kind().attach_key(),
                        "entity attached"
                    );
                    entities.attach(entity);
                }
                Err(err) => {
                    tracing::debug!(checker = spec.name(), error = %err, "validation chain stopped");
                    return Err(err);
                }
            }
        }

        Ok(entities)
    }
}

impl FromIterator<ValidationSpec> for ValidationChain {
    fn from_iter<T: IntoIterator<Item = ValidationSpec>>(iter: T) -> Self {
        Self {
            specs: iter.into_iter().collect(),
        }
    }
}
