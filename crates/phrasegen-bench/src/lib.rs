mod fixtures;

pub use fixtures::registry;
pub use fixtures::template_fixtures;
pub use fixtures::TemplateFixture;
pub use fixtures::ROUTE_CODE;
