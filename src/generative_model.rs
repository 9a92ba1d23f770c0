use std::{fmt, sync::Arc};

use crate::{
    client::{Model, Transport},
    generation::ContentBuilder,
    models::{Content, Part},
};

/// Handle to one deployed model.
///
/// The system instructions given at construction are sent, in order, ahead of the
/// conversation on every request issued through the handle. The handle itself never
/// changes; clone it freely.
#[derive(Clone)]
pub struct GenerativeModel {
    transport: Arc<dyn Transport>,
    model: Model,
    resource: String,
    system_instructions: Arc<[String]>,
}

impl fmt::Debug for GenerativeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerativeModel")
            .field("model", &self.model)
            .field("resource", &self.resource)
            .field("system_instructions", &self.system_instructions)
            .finish_non_exhaustive()
    }
}

impl GenerativeModel {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        model: Model,
        resource: String,
        system_instructions: Vec<String>,
    ) -> Self {
        Self {
            transport,
            model,
            resource,
            system_instructions: system_instructions.into(),
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Fully qualified resource name requests are sent to.
    pub fn resource_name(&self) -> &str {
        &self.resource
    }

    pub fn system_instructions(&self) -> &[String] {
        &self.system_instructions
    }

    /// The handle's instructions as a `systemInstruction` content, if there are any.
    pub(crate) fn system_instruction_content(&self) -> Option<Content> {
        if self.system_instructions.is_empty() {
            return None;
        }
        Some(Content::from_parts(
            self.system_instructions.iter().map(|text| Part::text(text.as_str())),
        ))
    }

    /// Start building a request against this model.
    pub fn generate_content(&self) -> ContentBuilder {
        ContentBuilder::new(
            self.transport.clone(),
            self.resource.clone(),
            self.system_instruction_content(),
        )
    }
}
