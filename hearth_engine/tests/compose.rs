//! End-to-end checks over the composed command plans and the host protocol.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

use hearth_engine::arrangement::Composer;
use hearth_engine::command::Command;
use hearth_engine::geometry::{CardinalDirection, Region};
use hearth_engine::host::HostClient;
use hearth_engine::kitchen::compose_kitchen;
use hearth_engine::session::Session;
use hearth_formats::{Catalog, SceneCatalog, Vec3};
use hearth_stream::{
    decode_payload, encode_message, CommandBatch, Hello, MessageHeader, MessageKind, RegionRecord,
    RegionReport, StepAck, HEADER_LEN,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

const FIXTURE: &str = include_str!("fixtures/catalog.json");

fn catalog() -> Catalog {
    Catalog::parse(FIXTURE).expect("fixture parses")
}

#[test]
fn lateral_run_stops_before_overrunning_the_wall() {
    let catalog = catalog();
    let scene = SceneCatalog::unfiltered(&catalog);
    let mut rng = StdRng::seed_from_u64(17);
    let region = Region::new(0.0, 2.5, 0.0, 4.0);
    let mut composer = Composer::new(&scene, region, &mut rng);
    // Widths 1.0 + 0.8 fit in 2.5; the 1.2 unit would overrun and stops the run.
    let placed = composer.lateral_run(
        CardinalDirection::South,
        Vec3::new(0.0, 0.0, 0.28),
        &["unit_a", "unit_b", "unit_c"],
        2.5,
    );
    assert_eq!(placed, 2);
    let plan = composer.finish();
    let created: Vec<&str> = plan
        .commands()
        .iter()
        .filter_map(|command| match command {
            Command::AddObject { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(created, ["unit_a", "unit_b"]);
}

#[test]
fn lateral_objects_sit_flush_along_the_run() {
    let catalog = catalog();
    let scene = SceneCatalog::unfiltered(&catalog);
    let mut rng = StdRng::seed_from_u64(17);
    let region = Region::new(0.0, 4.0, 0.0, 4.0);
    let mut composer = Composer::new(&scene, region, &mut rng);
    composer.lateral_run(
        CardinalDirection::South,
        Vec3::new(0.0, 0.0, 0.28),
        &["unit_a", "unit_b"],
        4.0,
    );
    let plan = composer.finish();
    let positions: Vec<f32> = plan
        .commands()
        .iter()
        .filter_map(|command| match command {
            Command::AddObject { position, .. } => Some(position.x),
            _ => None,
        })
        .collect();
    // unit_a (width 1.0) centered at 0.5, unit_b (width 0.8) at 1.4.
    assert_eq!(positions.len(), 2);
    assert!((positions[0] - 0.5).abs() < 1e-5);
    assert!((positions[1] - 1.4).abs() < 1e-5);
}

#[test]
fn lateral_run_follows_the_west_wall() {
    let catalog = catalog();
    let scene = SceneCatalog::unfiltered(&catalog);
    let mut rng = StdRng::seed_from_u64(17);
    let region = Region::new(0.0, 4.0, 0.0, 4.0);
    let mut composer = Composer::new(&scene, region, &mut rng);
    // The units turn 90 degrees against the wall, so their 0.54 m depth
    // lies along x and the run fits flush against x_min.
    let placed = composer.lateral_run(
        CardinalDirection::West,
        Vec3::new(0.28, 0.0, 0.28),
        &["unit_a", "unit_b", "unit_c"],
        2.5,
    );
    assert_eq!(placed, 2);
    let plan = composer.finish();
    let created: Vec<(f32, f32, f32)> = plan
        .commands()
        .iter()
        .filter_map(|command| match command {
            Command::AddObject {
                position, rotation, ..
            } => Some((position.x, position.z, rotation.y)),
            _ => None,
        })
        .collect();
    assert_eq!(created.len(), 2);
    for &(x, z, yaw) in &created {
        assert!((x - 0.28).abs() < 1e-5, "unit strayed from the wall: {x}");
        assert_eq!(yaw, CardinalDirection::West.wall_rotation());
        assert!(z > 0.0);
    }
    assert!((created[0].1 - 0.78).abs() < 1e-5);
    assert!((created[1].1 - 1.68).abs() < 1e-5);
}

#[test]
fn lateral_run_follows_the_east_wall() {
    let catalog = catalog();
    let scene = SceneCatalog::unfiltered(&catalog);
    let mut rng = StdRng::seed_from_u64(17);
    let region = Region::new(0.0, 4.0, 0.0, 4.0);
    let mut composer = Composer::new(&scene, region, &mut rng);
    let placed = composer.lateral_run(
        CardinalDirection::East,
        Vec3::new(4.0 - 0.28, 0.0, 0.28),
        &["unit_a", "unit_b", "unit_c"],
        2.5,
    );
    assert_eq!(placed, 2);
    let plan = composer.finish();
    for command in plan.commands() {
        if let Command::AddObject {
            position, rotation, ..
        } = command
        {
            assert!((position.x - 3.72).abs() < 1e-5);
            assert_eq!(rotation.y, CardinalDirection::East.wall_rotation());
        }
    }
}

#[test]
fn pivot_rotations_are_bracketed_by_parenting() {
    let catalog = catalog();
    let region = Region::centered(6.0, 4.0);
    let plan = compose_kitchen(&catalog, region, 23).expect("composes");
    let commands = plan.commands();

    // Map each parented child to the index of its parent command.
    let mut parented_at: BTreeMap<u64, (usize, u64)> = BTreeMap::new();
    for (index, command) in commands.iter().enumerate() {
        match command {
            Command::ParentObjectToObject { id, parent_id } => {
                parented_at.insert(*id, (index, *parent_id));
            }
            Command::UnparentObject { id } => {
                let (parent_index, parent_id) = parented_at
                    .remove(id)
                    .unwrap_or_else(|| panic!("unparent of {id} without a parent command"));
                // Between parent and unparent there must be a world-space
                // pivot rotation of the parent object.
                let rotated = commands[parent_index..index].iter().any(|c| {
                    matches!(
                        c,
                        Command::RotateObjectBy {
                            id,
                            is_world: true,
                            use_centroid: false,
                            ..
                        } if *id == parent_id
                    )
                });
                assert!(rotated, "child {id} unparented without a pivot rotation");
            }
            _ => {}
        }
    }
    assert!(parented_at.is_empty(), "some children were never unparented");
}

#[test]
fn plans_serialize_to_tagged_dictionaries() {
    let catalog = catalog();
    let region = Region::centered(6.0, 4.0);
    let plan = compose_kitchen(&catalog, region, 5).expect("composes");
    assert!(!plan.is_empty());
    for value in plan.to_values().expect("serializes") {
        let tag = value["$type"].as_str().expect("every command is tagged");
        assert!(!tag.is_empty());
    }
}

fn read_message(stream: &mut TcpStream) -> (MessageKind, Vec<u8>) {
    let mut header_bytes = [0u8; HEADER_LEN];
    stream.read_exact(&mut header_bytes).expect("read header");
    let header = MessageHeader::decode(&header_bytes).expect("decode header");
    let mut payload = vec![0u8; header.length as usize];
    stream.read_exact(&mut payload).expect("read payload");
    (header.kind, payload)
}

fn write_message<T: serde::Serialize>(stream: &mut TcpStream, kind: MessageKind, payload: &T) {
    let bytes = encode_message(kind, payload).expect("encode message");
    stream.write_all(&bytes).expect("write message");
}

/// A minimal scripted host: hello, region report, step ack.
fn fake_host(listener: TcpListener) -> thread::JoinHandle<CommandBatch> {
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let (kind, payload) = read_message(&mut stream);
        assert_eq!(kind, MessageKind::Hello);
        let hello: Hello = decode_payload(&payload).expect("decode hello");
        assert_eq!(hello.protocol, "HearthStream");
        write_message(
            &mut stream,
            MessageKind::Hello,
            &Hello::new("fake_host", None),
        );

        let (kind, payload) = read_message(&mut stream);
        assert_eq!(kind, MessageKind::CommandBatch);
        let query: CommandBatch = decode_payload(&payload).expect("decode batch");
        assert_eq!(query.commands.len(), 1);
        assert_eq!(query.commands[0]["$type"], "send_scene_regions");
        write_message(
            &mut stream,
            MessageKind::RegionReport,
            &RegionReport {
                seq: query.seq,
                regions: vec![RegionRecord {
                    id: 0,
                    x_min: -3.0,
                    x_max: 3.0,
                    z_min: -2.0,
                    z_max: 2.0,
                }],
            },
        );

        let (kind, payload) = read_message(&mut stream);
        assert_eq!(kind, MessageKind::CommandBatch);
        let placement: CommandBatch = decode_payload(&payload).expect("decode batch");
        write_message(
            &mut stream,
            MessageKind::StepAck,
            &StepAck {
                seq: placement.seq,
                frames: 100,
            },
        );
        placement
    })
}

#[test]
fn session_runs_to_completion_against_a_scripted_host() {
    let catalog = catalog();
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let host = fake_host(listener);

    let mut session = Session::new(&catalog, 41);
    let mut client = HostClient::connect(addr, None).expect("connect");
    client.run(&mut session).expect("session runs");
    assert!(session.is_done());
    assert_eq!(session.region(), Some(Region::new(-3.0, 3.0, -2.0, 2.0)));

    let placement = host.join().expect("host thread");
    assert!(placement.commands.len() > 1);
    let last = placement.commands.last().expect("settle command");
    assert_eq!(last["$type"], "step_physics");

    // The placement batch must match a local composition with the same seed.
    let plan = compose_kitchen(&catalog, Region::new(-3.0, 3.0, -2.0, 2.0), 41)
        .expect("composes");
    let mut expected = plan.to_values().expect("serializes");
    expected.push(serde_json::json!({"$type": "step_physics", "frames": 100}));
    assert_eq!(placement.commands, expected);
}
