//! Message Composition
//!
//! Template table and the factory that fills it in.

pub mod factory;
pub mod templates;

pub use factory::{FactoryError, MessageFactory};
pub use templates::{
    AddressedTemplates, BandedTemplates, GossipTemplates, MessageTemplates, TemplateError,
};
