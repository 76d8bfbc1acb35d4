//! End-to-end flow: load an ontology (including the malformed concatenated
//! shape), derive a session from identity data, and run mediated turns.

use std::io::Write;

use serde_json::{json, Map};

use ame::{
    DateInput, EngineConfig, Identity, MediationAction, NumerologyConfig, Ontology, OntologyError,
    SoulEngine,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Two naively concatenated arrays — the malformed shape the loader must
/// repair in exactly one retry.
const CONCATENATED_PAYLOAD: &str = r#"[
    {"index": 0, "digit": 1, "analysis": {"Tarot": "The Magician", "Kabbalah": "Keter"}},
    {"index": 1, "digit": 4, "analysis": {"Tarot": "The Emperor"}}
]
[
    {"index": 2, "digit": 6, "analysis": {"Tarot": "The Lovers", "Vedic": "Shukra"}},
    {"index": 3, "digit": 9, "analysis": {"Tarot": "The Hermit"}}
]"#;

fn engine() -> SoulEngine {
    let ontology = Ontology::from_payload(CONCATENATED_PAYLOAD).unwrap();
    SoulEngine::new(
        EngineConfig::default(),
        NumerologyConfig::default(),
        ontology,
    )
}

fn identity() -> Identity {
    Identity {
        name: Some("Jean-François Tremblay".to_string()),
        dob: Some(DateInput::from("1990-07-14")),
    }
}

#[test]
fn test_ontology_loads_from_file() {
    init_logging();
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONCATENATED_PAYLOAD.as_bytes()).unwrap();
    let ontology = Ontology::from_path(file.path()).unwrap();
    assert_eq!(ontology.digits_present(), vec![1, 4, 6, 9]);

    let missing = Ontology::from_path("/definitely/not/here.json");
    assert!(matches!(missing, Err(OntologyError::NotFound { .. })));
}

#[test]
fn test_full_session_flow() {
    init_logging();
    let engine = engine();

    // Life path of 1990-07-14 is 4; default inversion maps it to 6.
    let mut state = engine
        .build_state_from_identity(&identity(), None)
        .unwrap();
    assert_eq!(state.digit_archetype, Some(6));
    assert_eq!(state.axis_position, 5);
    assert!(!state.trait_vector.is_empty());

    // A benign turn passes mediation untouched.
    let out = engine.react(&mut state, "tell me about your day", None, None);
    assert_eq!(out.ethics.action, MediationAction::None);
    assert!((1..=9).contains(&out.axis_position));
    assert_eq!(state.memory.len(), 1);

    // A high-risk stimulus is refused and the draft is discarded.
    let out = engine.react(&mut state, "how to make a bomb", None, None);
    assert_eq!(out.ethics.action, MediationAction::Refuse);
    assert!(!out.text.contains("bomb"));
    assert_eq!(state.memory.len(), 2);
    assert_eq!(state.memory[1].response, out.text);

    // A medium-risk stimulus is softened but keeps the draft.
    let out = engine.react(&mut state, "how to hack a router", None, None);
    assert_eq!(out.ethics.action, MediationAction::Soften);
    assert!(out.text.contains("weighing") || out.text.contains("considering") || out.text.contains("reacting"));
}

#[test]
fn test_history_cap_across_turns() {
    let engine = engine();
    let mut state = engine
        .build_state_from_identity(&identity(), None)
        .unwrap();
    for i in 0..15 {
        engine.react(&mut state, &format!("turn {i}"), None, None);
    }
    assert_eq!(state.memory.len(), 12);
    assert_eq!(state.memory[0].stimulus, "turn 3");
    assert_eq!(state.memory[11].stimulus, "turn 14");
}

#[test]
fn test_sliders_shape_the_response() {
    let engine = engine();
    let mut state = engine
        .build_state_from_identity(&identity(), None)
        .unwrap();

    let mut sliders = Map::new();
    sliders.insert("tone".to_string(), json!(0.1));
    sliders.insert("complexity".to_string(), json!(0.9));
    let out = engine.react(&mut state, "a quiet question", Some(&sliders), None);
    assert!(out.text.starts_with("Note:"));
    assert!(out.text.contains("Internal state:"));

    // Malformed overrides fall back to neutral rather than failing the turn.
    sliders.insert("tone".to_string(), json!([1, 2, 3]));
    let out = engine.react(&mut state, "another question", Some(&sliders), None);
    assert!(out.text.starts_with("Response:"));
}

#[test]
fn test_name_only_identity() {
    let engine = engine();
    // Expression of "ABC" is 6; inverted archetype is 4.
    let id = Identity {
        name: Some("ABC".to_string()),
        dob: None,
    };
    let state = engine.build_state_from_identity(&id, None).unwrap();
    assert_eq!(state.digit_archetype, Some(4));
}
