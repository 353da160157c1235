// Unit tests for request rendering

use crate::protocol::{Command, DevInfoField, ParameterAddress, ParameterValueType};

/// **VALUE**: Verifies the handshake renders exactly as the appliance expects it.
///
/// **BUG THIS CATCHES**: A typo here makes every connection fail its handshake.
#[test]
fn given_run_mode_command_when_rendered_then_devstatus_runmode() {
    assert_eq!(Command::RunMode.to_string(), "devstatus runmode");
    assert_eq!(Command::RunMode.verb(), "devstatus");
}

#[test]
fn given_each_devinfo_field_when_rendered_then_uses_wire_name() {
    let rendered: Vec<String> = DevInfoField::ALL
        .iter()
        .map(|field| Command::DevInfo(*field).to_string())
        .collect();

    assert_eq!(
        rendered,
        vec![
            "devinfo protocolver",
            "devinfo paramsetver",
            "devinfo version",
            "devinfo productname",
            "devinfo serialno",
            "devinfo deviceid",
            "devinfo devicename",
        ]
    );
}

/// **VALUE**: Verifies the value type only changes the verb.
#[test]
fn given_matrix_address_when_query_rendered_then_verb_follows_value_type() {
    // GIVEN: Matrix index 4
    let address = ParameterAddress::matrix_index(4);

    // WHEN: Rendering raw and normalized queries
    let raw = Command::query(ParameterValueType::Raw, address.clone()).to_string();
    let normalized = Command::query(ParameterValueType::Normalized, address).to_string();

    // THEN: Same address, different verb
    assert_eq!(raw, "get MTX:Index_4 0 0");
    assert_eq!(normalized, "getn MTX:Index_4 0 0");
}

#[test]
fn given_set_command_when_rendered_then_value_is_appended() {
    let address = ParameterAddress::new("MTX:mute").with_indices("2", "1");

    let raw = Command::set(ParameterValueType::Raw, address.clone(), "1");
    let normalized = Command::set(ParameterValueType::Normalized, address, "750");

    assert_eq!(raw.to_string(), "set MTX:mute 2 1 1");
    assert_eq!(normalized.to_string(), "setn MTX:mute 2 1 750");
    assert_eq!(normalized.verb(), "setn");
}

#[test]
fn given_value_type_when_deserialized_then_accepts_lowercase_names() {
    let raw: ParameterValueType = serde_json::from_str("\"raw\"").expect("raw");
    let normalized: ParameterValueType = serde_json::from_str("\"normalized\"").expect("normalized");

    assert_eq!(raw, ParameterValueType::Raw);
    assert_eq!(normalized, ParameterValueType::Normalized);
    assert_eq!(ParameterValueType::default(), ParameterValueType::Raw);
}
