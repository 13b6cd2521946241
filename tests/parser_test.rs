//! Integration tests for the HL7 v2 parser

use hl7stage::domain::Hl7Error;
use hl7stage::hl7::{parse, Delimiters, Hl7Parser, Node};
use test_case::test_case;

const ADT_A01: &str = "MSH|^~\\&|ADT1|GOOD HEALTH HOSPITAL|GHH LAB|ELAB-3|198808181126|SECURITY|ADT^A01^ADT_A01|MSG00001|P|2.8\r\
EVN|A01|200708181123\r\
PID|1||PATID1234^5^M11^ADT1^MR^GOOD HEALTH HOSPITAL~123456789^^^USSSA^SS||EVERYMAN^ADAM^A^III||19610615|M\r\
NK1|1|JONES^BARBARA^K|SPO^Spouse\r\
NK1|2|JONES^MICHAEL|FTH^Father\r\
PV1|1|I|2000^2012^01||||004777^ATTEND^AARON^A|||SUR";

#[test]
fn test_parses_full_adt_message() {
    let message = parse(ADT_A01.as_bytes()).unwrap();

    let names: Vec<&str> = message.segments.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["MSH", "EVN", "PID", "NK1", "NK1", "PV1"]);

    assert_eq!(message.header.sending_application.as_deref(), Some("ADT1"));
    assert_eq!(message.header.sending_facility.as_deref(), Some("GOOD HEALTH HOSPITAL"));
    assert_eq!(message.header.message_type.as_deref(), Some("ADT"));
    assert_eq!(message.header.trigger_event.as_deref(), Some("A01"));
    assert_eq!(message.header.message_structure.as_deref(), Some("ADT_A01"));
    assert_eq!(message.header.control_id.as_deref(), Some("MSG00001"));
    assert_eq!(message.header.processing_id.as_deref(), Some("P"));
    assert_eq!(message.header.version.as_deref(), Some("2.8"));
}

#[test]
fn test_repeated_segments_keep_order() {
    let message = parse(ADT_A01.as_bytes()).unwrap();
    let relations: Vec<&str> = message
        .segments_named("NK1")
        .filter_map(|s| s.component(3, 2))
        .collect();
    assert_eq!(relations, ["Spouse", "Father"]);
}

#[test]
fn test_field_repetitions() {
    let message = parse(ADT_A01.as_bytes()).unwrap();
    let pid3 = message.segment("PID").unwrap().field(3).unwrap();
    assert_eq!(pid3.len(), 2);
    assert_eq!(pid3.first_value(), Some("PATID1234"));
    assert_eq!(pid3.child(1).and_then(Node::first_value), Some("123456789"));
}

#[test_case("MSH|^~\\&|A\rPID|1", 2 ; "carriage return")]
#[test_case("MSH|^~\\&|A\r\nPID|1\r\n", 2 ; "crlf")]
#[test_case("MSH|^~\\&|A\nPID|1\n", 2 ; "line feed")]
#[test_case("\u{feff}MSH|^~\\&|A\r\r\rPID|1\r \r", 2 ; "bom and blank lines")]
fn test_segment_terminators(raw: &str, expected: usize) {
    let message = parse(raw.as_bytes()).unwrap();
    assert_eq!(message.segments.len(), expected);
}

#[test]
fn test_declared_delimiters_are_used() {
    let message = parse(b"MSH#*@!%#APP#FAC\rPID#1##A*B@C").unwrap();
    assert_eq!(
        message.delimiters,
        Delimiters {
            field: '#',
            component: '*',
            repetition: '@',
            escape: '!',
            subcomponent: '%',
        }
    );

    let pid3 = message.segment("PID").unwrap().field(3).unwrap();
    assert_eq!(pid3.len(), 2);
    assert_eq!(message.segment("PID").unwrap().component(3, 2), Some("B"));
}

#[test]
fn test_missing_encoding_characters_fall_back_to_configured_defaults() {
    let parser = Hl7Parser::with_defaults(Delimiters {
        subcomponent: '$',
        ..Delimiters::default()
    });
    let message = parser.parse(b"MSH|^~\\|APP").unwrap();
    assert_eq!(message.delimiters.subcomponent, '$');
}

#[test]
fn test_escape_sequences_decoded() {
    let message = parse(b"MSH|^~\\&|A\rNTE|1||a\\F\\b\\S\\c\\T\\d\\R\\e\\E\\f").unwrap();
    let comment = message.segment("NTE").unwrap().field(3).unwrap();
    assert_eq!(comment.first_value(), Some("a|b^c&d~e\\f"));
}

#[test]
fn test_escaped_delimiter_does_not_split() {
    let message = parse(b"MSH|^~\\&|A\rNTE|1||left\\S\\right").unwrap();
    let comment = message.segment("NTE").unwrap().field(3).unwrap();
    assert_eq!(comment.child(0).map(Node::len), Some(1));
}

#[test]
fn test_invalid_utf8_is_decoded_lossily() {
    let message = parse(b"MSH|^~\\&|A\rPID|1||caf\xe9").unwrap();
    let value = message.segment("PID").unwrap().field(3).unwrap().first_value();
    assert_eq!(value, Some("caf\u{fffd}"));
}

#[test_case(b"" ; "empty")]
#[test_case(b"  \r\n " ; "whitespace only")]
fn test_empty_input(raw: &[u8]) {
    assert_eq!(parse(raw).unwrap_err(), Hl7Error::Empty);
}

#[test]
fn test_first_segment_must_be_msh() {
    let err = parse(b"PID|1||42\rMSH|^~\\&|A").unwrap_err();
    assert_eq!(
        err,
        Hl7Error::MissingHeader {
            found: "PID".to_string()
        }
    );
}

#[test_case(b"MSH" ; "no field separator")]
#[test_case(b"MSH|" ; "no encoding characters")]
#[test_case(b"MSH||APP|FAC" ; "empty encoding characters")]
fn test_header_without_delimiters(raw: &[u8]) {
    assert!(matches!(
        parse(raw).unwrap_err(),
        Hl7Error::HeaderTooShort { .. }
    ));
}

#[test_case(b"MSH|^^\\&|A" ; "duplicate component")]
#[test_case(b"MSH^^~\\&^A" ; "component equals field separator")]
#[test_case(b"MSH|a~\\&|A" ; "alphanumeric delimiter")]
fn test_unusable_delimiters(raw: &[u8]) {
    assert!(matches!(
        parse(raw).unwrap_err(),
        Hl7Error::InvalidEncodingCharacters(_)
    ));
}

#[test]
fn test_bad_segment_name_names_position() {
    let err = parse(b"MSH|^~\\&|A\rPID|1\rP-D|2").unwrap_err();
    assert_eq!(
        err,
        Hl7Error::InvalidSegmentName {
            position: 3,
            name: "P-D".to_string()
        }
    );
}
