use hello::{add_hello, Hello, HelloParameters};
use reagent_core::{
    create_simulator_instance, Environment, EnvironmentConfig, Error, Topology, ValidationError,
};

fn fast_env() -> Environment {
    Environment::new(EnvironmentConfig::default().with_fast(true))
}

#[test]
fn test_root_hello_prints_startup_line() {
    let mut env = fast_env();
    let id = add_hello(&mut env, None, "Hello", &HelloParameters { test_param: 10 }).unwrap();

    env.run().unwrap();

    let transcript = &env.state::<Hello>(id).unwrap().transcript;
    assert_eq!(transcript.len(), 1);

    let line = &transcript[0];
    assert!(line.starts_with("(0ns, 0), physical_time: "));
    assert!(line.contains(
        "Starting up reaction Bank:0 name:Hello fully_qualified_name:Hello test_param:10 test_local:0"
    ));
}

#[test]
fn test_out_of_bounds_parameter_aborts_construction() {
    let mut env = fast_env();
    let err = add_hello(&mut env, None, "Hello", &HelloParameters { test_param: 150 }).unwrap_err();

    assert!(matches!(
        err.as_validation(),
        Some(ValidationError::OutOfBounds { .. })
    ));
    // Nothing was attached, so there is nothing to print
    assert!(env.is_empty());
    assert!(env.find("Hello").is_none());
}

#[test]
fn test_duplicate_sibling_is_rejected() {
    let mut env = fast_env();
    let params = HelloParameters::default();
    let main = add_hello(&mut env, None, "Main", &params).unwrap();

    add_hello(&mut env, Some(main), "Hello", &params).unwrap();
    let err = add_hello(&mut env, Some(main), "Hello", &params).unwrap_err();

    assert!(matches!(
        err,
        Error::Validation(ValidationError::DuplicateReactor { .. })
    ));
}

#[test]
fn test_nested_hello_reports_its_own_identity() {
    let mut env = fast_env();
    let params = HelloParameters::default();
    let main = add_hello(&mut env, None, "Main", &params).unwrap();
    let child = add_hello(&mut env, Some(main), "Hello", &HelloParameters { test_param: 42 }).unwrap();

    env.run().unwrap();

    let parent_line = &env.state::<Hello>(main).unwrap().transcript[0];
    let child_line = &env.state::<Hello>(child).unwrap().transcript[0];
    assert!(parent_line.contains("name:Main fully_qualified_name:Main test_param:10"));
    assert!(child_line.contains("name:Hello fully_qualified_name:Main.Hello test_param:42"));
}

#[test]
fn test_startup_fires_once() {
    let mut env = fast_env();
    let id = add_hello(&mut env, None, "Hello", &HelloParameters::default()).unwrap();

    let summary = env.run().unwrap();

    assert_eq!(env.state::<Hello>(id).unwrap().transcript.len(), 1);
    assert_eq!(summary.reactions_executed, 1);
}

#[test]
fn test_visualize_renders_topology() {
    let mut env = create_simulator_instance(1, true, None, true);
    add_hello(&mut env, None, "Hello", &HelloParameters::default()).unwrap();

    let summary = env.run().unwrap();
    let rendered = summary.topology.expect("topology rendered");

    let topology = Topology::from_ron(&rendered).unwrap();
    let hello = topology.find("Hello").unwrap();
    assert_eq!(hello.parameters[0].name, "test_param");
    assert_eq!(hello.reactions[0].label, "reaction_1");
}

#[test]
fn test_no_rendering_without_visualize() {
    let mut env = fast_env();
    add_hello(&mut env, None, "Hello", &HelloParameters::default()).unwrap();
    assert!(env.run().unwrap().topology.is_none());
}
