use std::fmt;
use std::sync::OnceLock;

use phrasegen_expand::MacroRegistry;
use phrasegen_expand::Variant;

#[derive(Clone)]
pub struct TemplateFixture {
    pub label: &'static str,
    pub source: &'static str,
}

impl fmt::Display for TemplateFixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label)
    }
}

const TEMPLATES: &[(&str, &str)] = &[
    ("literal", "what time is it"),
    ("alternatives", "(what is|tell me) the (time|hour) (please|)"),
    ("single_macro", "(take me|drive me|go) to {place:W}"),
    ("two_macros", "from {place:W} to {place:W} (at|around) {hour:W}"),
    ("three_macros", "(take|bring) {person:W} from {place:W} to {place:W}"),
];

pub const ROUTE_CODE: &str = "\
def answer_route(c):
    c.route(tstart(place), tend(place), \"mvar(place, LABEL)\")
    c.trip(\"mvar(place, LABEL, 1)\", tstart(place, 1))
";

pub fn template_fixtures() -> &'static [TemplateFixture] {
    static FIXTURES: OnceLock<Vec<TemplateFixture>> = OnceLock::new();
    FIXTURES
        .get_or_init(|| {
            TEMPLATES
                .iter()
                .map(|&(label, source)| TemplateFixture { label, source })
                .collect()
        })
        .as_slice()
}

/// A registry with a few dozen variants per macro, roughly the size of an
/// everyday skill module.
pub fn registry() -> MacroRegistry {
    let mut registry = MacroRegistry::new();

    let places = [
        "home", "work", "the airport", "the station", "the gym", "downtown", "the beach",
        "my parents", "the office", "the harbor", "the museum", "the stadium",
    ];
    for place in places {
        registry.register(
            "bench",
            "en",
            "place",
            Variant::new().with("W", place).with("LABEL", place.to_uppercase()),
        );
    }

    for hour in 1..=12 {
        registry.register(
            "bench",
            "en",
            "hour",
            Variant::new().with("W", format!("{hour} o'clock")),
        );
    }

    for person in ["mom", "dad", "my sister", "the kids", "grandma", "my friend"] {
        registry.register("bench", "en", "person", Variant::new().with("W", person));
    }

    registry
}
