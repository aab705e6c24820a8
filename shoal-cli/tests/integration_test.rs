use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shoal_cli::{load_scene, run, RunOptions, Simulation};
use shoal_shared::{FrameReport, SceneSettings};
use std::io::Write;

/// A small walled tank with a rock and a moving target
const TANK_SCENE: &str = r#"{
    "flock": { "max_speed": 3.0, "noise_weight": 0.1 },
    "spawn": { "count": 30, "radius": 2.0, "origin": { "x": 0.0, "y": 0.0 } },
    "obstacles": [
        { "type": "segment", "a": { "x": -8.0, "y": -8.0 }, "b": { "x": 8.0, "y": -8.0 } },
        { "type": "segment", "a": { "x": 8.0, "y": -8.0 }, "b": { "x": 8.0, "y": 8.0 } },
        { "type": "segment", "a": { "x": 8.0, "y": 8.0 }, "b": { "x": -8.0, "y": 8.0 } },
        { "type": "segment", "a": { "x": -8.0, "y": 8.0 }, "b": { "x": -8.0, "y": -8.0 } },
        { "type": "circle", "center": { "x": 3.0, "y": 3.0 }, "radius": 1.0 }
    ],
    "target": { "x": 0.0, "y": 5.0 },
    "events": [
        { "type": "target", "at": 0.5, "position": { "x": -4.0, "y": -4.0 } },
        { "type": "settings", "at": 1.0, "settings": { "max_speed": 2.0 } }
    ]
}"#;

fn parse_frames(output: &[u8]) -> Vec<FrameReport> {
    String::from_utf8(output.to_vec())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_run_writes_expected_frames() -> Result<()> {
    let scene = SceneSettings::from_json(TANK_SCENE)?;
    let options = RunOptions {
        ticks: 100,
        dt: 0.02,
        every: 10,
        ..RunOptions::default()
    };
    let mut rng = StdRng::seed_from_u64(1);
    let mut out = Vec::new();

    let summary = run(&scene, &options, &mut rng, &mut out)?;

    assert_eq!(summary.ticks, 100);
    assert_eq!(summary.frames, 10);
    assert_eq!(summary.agents, 30);
    assert!((summary.sim_time - 2.0).abs() < 1e-4);

    let frames = parse_frames(&out);
    assert_eq!(frames.len(), 10);
    assert_eq!(frames[0].tick, 10);
    assert_eq!(frames[9].tick, 100);
    for frame in &frames {
        assert_eq!(frame.agents.len(), 30);
        assert!(frame.probes.is_empty());
    }

    // Speed limit drops to 2.0 once the settings event fires at t=1.0.
    for frame in frames.iter().filter(|f| f.time > 1.05) {
        assert!(frame.max_speed() <= 2.0 + 1e-4);
    }
    assert!(summary.max_speed_seen <= 3.0 + 1e-4);

    Ok(())
}

#[test]
fn test_every_zero_writes_final_frame_only() -> Result<()> {
    let scene = SceneSettings::from_json(TANK_SCENE)?;
    let options = RunOptions {
        ticks: 25,
        dt: 0.02,
        every: 0,
        ..RunOptions::default()
    };
    let mut rng = StdRng::seed_from_u64(2);
    let mut out = Vec::new();

    let summary = run(&scene, &options, &mut rng, &mut out)?;
    let frames = parse_frames(&out);

    assert_eq!(summary.frames, 1);
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].tick, 25);
    Ok(())
}

#[test]
fn test_seeded_runs_are_reproducible() -> Result<()> {
    let scene = SceneSettings::from_json(TANK_SCENE)?;
    let options = RunOptions {
        ticks: 50,
        dt: 0.02,
        every: 5,
        use_grid: true,
        ..RunOptions::default()
    };

    let mut first = Vec::new();
    let mut second = Vec::new();
    run(&scene, &options, &mut StdRng::seed_from_u64(9), &mut first)?;
    run(&scene, &options, &mut StdRng::seed_from_u64(9), &mut second)?;

    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_probe_rays_mark_hits() -> Result<()> {
    let scene = SceneSettings::from_json(
        r#"{
            "flock": { "ray_count": 3, "avoid_distance": 2.0 },
            "spawn": { "count": 1, "radius": 0.0, "forward": { "x": 0.0, "y": 1.0 } },
            "obstacles": [
                { "type": "segment", "a": { "x": -5.0, "y": 1.0 }, "b": { "x": 5.0, "y": 1.0 } }
            ]
        }"#,
    )?;
    let mut rng = StdRng::seed_from_u64(3);
    let sim = Simulation::new(&scene, false, &mut rng)?;

    let frame = sim.frame(true);
    assert_eq!(frame.tick, 0);
    assert_eq!(frame.probes.len(), 3);
    // The spawn jitter tilts the agent by at most ~11.5 degrees, so every
    // ray in the 60 degree fan still reaches the wall one unit ahead.
    assert!(frame.probes.iter().all(|p| p.hit));
    assert!(frame.probes.iter().all(|p| (p.end.y - 1.0).abs() < 1e-4));
    Ok(())
}

#[test]
fn test_invalid_scene_is_rejected() {
    let scene = SceneSettings::from_json(r#"{ "flock": { "max_speed": 0.0 } }"#).unwrap();
    let mut rng = StdRng::seed_from_u64(4);
    let err = run(&scene, &RunOptions::default(), &mut rng, &mut Vec::new()).unwrap_err();
    assert!(format!("{:#}", err).contains("max_speed"));

    let crowded = SceneSettings::from_json(r#"{ "spawn": { "count": 5000 } }"#).unwrap();
    assert!(Simulation::new(&crowded, false, &mut rng).is_err());

    let many_rays =
        SceneSettings::from_json(r#"{ "flock": { "ray_count": 4294967295 } }"#).unwrap();
    let options = RunOptions {
        probes: true,
        ..RunOptions::default()
    };
    let err = run(&many_rays, &options, &mut rng, &mut Vec::new()).unwrap_err();
    assert!(format!("{:#}", err).contains("ray_count"));
}

#[test]
fn test_load_scene_from_file() -> Result<()> {
    let path = std::env::temp_dir().join(format!("shoal-scene-{}.json", std::process::id()));
    let mut file = std::fs::File::create(&path)?;
    file.write_all(TANK_SCENE.as_bytes())?;
    drop(file);

    let scene = load_scene(Some(path.as_path()))?;
    std::fs::remove_file(&path)?;

    assert_eq!(scene.spawn.count, 30);
    assert_eq!(scene.obstacles.len(), 5);
    assert!(load_scene(Some(path.as_path())).is_err());
    assert_eq!(load_scene(None)?, SceneSettings::default());
    Ok(())
}
