use morph_model::{
    Attribute, AttributePath, Component, Filter, Function, Job, Mapping,
    MappingAttributePathInstance, ParameterMap, Task, Transformation,
};

fn sample_task() -> Task {
    let input = MappingAttributePathInstance {
        name: "title".to_string(),
        attribute_path: AttributePath::new(vec![
            Attribute::new("http://example.com/record", "record"),
            Attribute::new("http://example.com/title", "title"),
        ]),
        ordinal: Some(2),
        filter: Some(Filter::new(r#"[{"http://example.com/lang":"de"}]"#)),
    };
    let output = MappingAttributePathInstance::new(
        "out",
        AttributePath::from_uris(["http://example.org/dc/title"]),
    );
    let component = Component {
        id: "c1".to_string(),
        name: "trim1".to_string(),
        function: Function::Transformation(Transformation {
            name: "transformation".to_string(),
            components: vec![Component {
                id: "c2".to_string(),
                name: "trim2".to_string(),
                function: Function::Function {
                    name: "trim".to_string(),
                    parameters: vec![],
                },
                parameter_mappings: ParameterMap::new(),
                input_components: vec![],
                output_components: vec![],
            }],
        }),
        parameter_mappings: [("dataset", "title")].into_iter().collect(),
        input_components: vec![],
        output_components: vec![],
    };
    Task {
        id: "t1".to_string(),
        name: Some("sample".to_string()),
        job: Job {
            mappings: vec![Mapping {
                id: "m1".to_string(),
                name: None,
                inputs: vec![input],
                output,
                transformation: Some(component),
            }],
            skip_filter: None,
        },
        input_data_model: None,
        output_data_model: None,
    }
}

#[test]
fn task_round_trips_through_json() {
    let task = sample_task();
    let json = serde_json::to_string(&task).expect("serialize task");
    let round: Task = serde_json::from_str(&json).expect("deserialize task");
    assert_eq!(round, task);
}

#[test]
fn function_tag_discriminates_builtin_and_transformation() {
    let builtin: Function =
        serde_json::from_str(r#"{"type":"function","name":"trim"}"#).expect("builtin");
    assert_eq!(builtin.name(), "trim");
    assert!(builtin.as_transformation().is_none());

    let transformation: Function = serde_json::from_str(
        r#"{"type":"transformation","name":"tf","components":[]}"#,
    )
    .expect("transformation");
    assert_eq!(transformation.name(), "tf");
    assert!(transformation.as_transformation().is_some());
}

#[test]
fn parameter_map_round_trips_in_order() {
    let map: ParameterMap = [("b", "2"), ("a", "1"), ("c", "3")].into_iter().collect();
    let json = serde_json::to_string(&map).expect("serialize map");
    assert_eq!(json, r#"{"b":"2","a":"1","c":"3"}"#);
    let round: ParameterMap = serde_json::from_str(&json).expect("deserialize map");
    let keys: Vec<&str> = round.keys().collect();
    assert_eq!(keys, vec!["b", "a", "c"]);
}

#[test]
fn optional_fields_default_when_absent() {
    let mapping: Mapping = serde_json::from_str(
        r#"{
            "id": "m9",
            "inputs": [{
                "name": "in",
                "attribute_path": {"attributes": [{"uri": "a", "name": "a"}]}
            }],
            "output": {
                "name": "out",
                "attribute_path": {"attributes": [{"uri": "b", "name": "b"}]}
            }
        }"#,
    )
    .expect("deserialize mapping");
    assert!(mapping.transformation.is_none());
    assert!(mapping.inputs[0].ordinal.is_none());
    assert!(mapping.inputs[0].filter.is_none());
}
