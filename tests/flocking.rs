//! End-to-end behaviour of the flocking core through its public API.

use approx::assert_relative_eq;
use glam::{Vec2, Vec3};
use rstest::rstest;

use flocking::integrate::IntegrationSettings;
use flocking::scheduler::TickSeeds;
use flocking::steering::{agent_rng, random_perturbation};
use flocking::{
    AgentAttributes, AgentStore, Bounds, BoundsMode, FlockConfig, FlockError, FlockId, FlockRegistry, Simulation,
    SimulationParams, TickScheduler,
};

fn attributes(flock: FlockId) -> AgentAttributes {
    AgentAttributes {
        flock,
        speed: 1.0,
        max_speed: 5.0,
        max_rotation_speed: 4.0,
    }
}

// A single flock with agents at fixed positions and headings
fn placed(config: FlockConfig, agents: &[(Vec3, Vec3)]) -> (AgentStore, FlockRegistry) {
    let mut registry = FlockRegistry::new();
    let flock = registry.create_flock(config).unwrap();
    let mut store = AgentStore::new();
    for &(position, direction) in agents {
        let index = store.append(position, direction, attributes(flock));
        registry.add_member(flock, index).unwrap();
    }
    (store, registry)
}

fn seeded(seed: u64) -> SimulationParams {
    SimulationParams {
        seed: Some(seed),
        ..SimulationParams::default()
    }
}

fn settings(elapsed: f32, bounds: Bounds) -> IntegrationSettings<'static> {
    IntegrationSettings {
        elapsed,
        wander: 0.0,
        integrate_speed: false,
        limit_rotation: false,
        bounds,
        bounds_mode: BoundsMode::Free,
        obstacles: &[],
        obstacle_margin: 1.0,
    }
}

#[test]
fn isolated_agent_steers_by_perturbation_only() {
    let params = SimulationParams {
        perturbation: 0.3,
        ..SimulationParams::default()
    };
    let (mut store, registry) = placed(
        FlockConfig::default(),
        &[
            (Vec3::ZERO, Vec3::X),
            (Vec3::new(500.0, 0.0, 0.0), Vec3::Y),
            (Vec3::new(0.0, 500.0, 0.0), Vec3::NEG_X),
        ],
    );

    TickScheduler::new().compute_steering(&mut store, &registry, &params, 77);

    for agent in 0..3 {
        let expected = random_perturbation(&mut agent_rng(77, agent), 0.3);
        assert_eq!(store.directions()[agent], expected);
    }
}

#[test]
fn agent_steers_toward_centroid_of_flockmates() {
    let config = FlockConfig {
        visibility: 10.0,
        separation_distance: 0.5,
        use_separation_rule: false,
        ..FlockConfig::default()
    };
    // Opposite headings cancel, leaving cohesion alone
    let (mut store, registry) = placed(
        config,
        &[
            (Vec3::ZERO, Vec3::X),
            (Vec3::new(1.0, 0.0, 0.0), Vec3::X),
            (Vec3::new(0.0, 1.0, 0.0), Vec3::NEG_X),
        ],
    );

    TickScheduler::new().compute_steering(&mut store, &registry, &SimulationParams::deterministic(), 0);

    let target = store.directions()[0];
    assert_relative_eq!(target.x, 0.5);
    assert_relative_eq!(target.y, 0.5);
    assert_relative_eq!(target.z, 0.0);
}

#[test]
fn crowded_pair_moves_apart() {
    let config = FlockConfig {
        visibility: 10.0,
        separation_distance: 2.0,
        use_alignment_rule: false,
        use_cohesion_rule: false,
        ..FlockConfig::default()
    };
    let (mut store, registry) = placed(
        config,
        &[(Vec3::ZERO, Vec3::Y), (Vec3::new(0.1, 0.0, 0.0), Vec3::Y)],
    );

    TickScheduler::new().run(
        &mut store,
        &registry,
        &SimulationParams::deterministic(),
        TickSeeds {
            steering: 0,
            integration: 0,
        },
        &settings(0.5, Bounds::default()),
    );

    let directions = store.directions();
    assert_relative_eq!(directions[0].x, -1.0);
    assert_relative_eq!(directions[0].y, 0.0);
    assert_relative_eq!(directions[1].x, 1.0);
    assert_relative_eq!(directions[1].y, 0.0);

    let positions = store.positions();
    assert!(positions[1].x - positions[0].x > 0.1);
}

#[test]
fn swap_relabels_the_write_generation() {
    let (mut store, _) = placed(
        FlockConfig::default(),
        &[(Vec3::ZERO, Vec3::X), (Vec3::ONE, Vec3::Y)],
    );
    {
        let (_, write) = store.split();
        write.positions[0] = Vec3::new(3.0, 4.0, 0.0);
        write.positions[1] = Vec3::new(-1.0, 2.0, 0.0);
    }
    let written = store.write_positions().to_vec();
    let generation = store.generation();

    store.swap_buffers();

    assert_eq!(store.positions(), written.as_slice());
    assert_eq!(store.generation(), generation + 1);
}

#[test]
fn spawned_agents_land_inside_bounds() {
    let bounds = Bounds::new(Vec2::new(-30.0, -10.0), Vec2::new(30.0, 10.0)).unwrap();
    let mut sim = Simulation::with_params(bounds, seeded(3), [FlockConfig::default()]).unwrap();

    let range = sim.spawn_agents(100, FlockId(0)).unwrap();

    assert_eq!(range, 0..100);
    assert_eq!(sim.members(FlockId(0)).unwrap().len(), 100);
    assert_eq!(sim.registry().get(FlockId(0)).unwrap().num_boids(), 100);
    for (position, direction) in sim.agent_snapshot() {
        assert!(bounds.contains(position), "{position} outside bounds");
        assert_relative_eq!(direction.length(), 1.0, epsilon = 1e-5);
    }
}

#[rstest]
#[case(1)]
#[case(25)]
#[case(250)]
fn growth_keeps_existing_agents(#[case] extra: usize) {
    let mut sim = Simulation::with_params(
        Bounds::default(),
        seeded(9),
        [FlockConfig::default(), FlockConfig::named("second")],
    )
    .unwrap();
    sim.populate().unwrap();
    sim.tick(0.016).unwrap();

    let before = sim.agent_snapshot();
    let second_before = sim.members(FlockId(1)).unwrap().to_vec();

    let added = sim.spawn_agents(extra, FlockId(1)).unwrap();

    assert_eq!(added.len(), extra);
    assert_eq!(sim.members(FlockId(1)).unwrap().len(), second_before.len() + extra);
    assert_eq!(&sim.members(FlockId(1)).unwrap()[..second_before.len()], second_before.as_slice());
    assert_eq!(&sim.agent_snapshot()[..before.len()], before.as_slice());
    assert_eq!(sim.members(FlockId(0)).unwrap().len(), 100);
}

#[test]
fn directions_stay_unit_length_across_ticks() {
    let params = SimulationParams {
        bounds_mode: BoundsMode::Wrap,
        ..seeded(21)
    };
    let mut sim = Simulation::with_params(Bounds::default(), params, [FlockConfig::default()]).unwrap();
    sim.populate().unwrap();

    for _ in 0..10 {
        sim.tick(0.05).unwrap();
    }

    for agent in sim.agents() {
        let length = agent.direction.length();
        if length > 0.0 {
            assert_relative_eq!(length, 1.0, epsilon = 1e-5);
        }
        assert!(sim.bounds().contains(agent.position));
    }
}

#[test]
fn identical_inputs_give_identical_ticks() {
    let params = SimulationParams {
        neighbor_strategy: flocking::NeighborStrategy::Grid,
        ..SimulationParams::deterministic()
    };
    let build = || {
        let mut sim =
            Simulation::with_params(Bounds::default(), params.clone(), [FlockConfig::default()]).unwrap();
        sim.populate().unwrap();
        sim
    };
    let mut first = build();
    let mut second = build();

    for _ in 0..5 {
        first.tick(0.02).unwrap();
        second.tick(0.02).unwrap();
    }

    assert_eq!(first.agent_snapshot(), second.agent_snapshot());
}

#[test]
fn same_seed_replays_noise() {
    let run = |parallel: bool| {
        let params = SimulationParams {
            enable_parallel: parallel,
            ..seeded(1234)
        };
        let mut sim = Simulation::with_params(Bounds::default(), params, [FlockConfig::default()]).unwrap();
        sim.populate().unwrap();
        for _ in 0..3 {
            sim.tick(0.02).unwrap();
        }
        sim.agent_snapshot()
    };

    assert_eq!(run(true), run(false));
}

#[test]
fn tick_reports_batches() {
    let params = SimulationParams {
        batch_size: 30,
        ..seeded(5)
    };
    let mut sim = Simulation::with_params(Bounds::default(), params, [FlockConfig::default()]).unwrap();
    sim.populate().unwrap();

    let stats = sim.tick(0.016).unwrap();

    assert_eq!(stats.tick, 1);
    assert_eq!(stats.agents, 100);
    assert_eq!(stats.batches, 4);
    assert_eq!(stats.batch_size, 30);
    assert_eq!(sim.last_stats(), &stats);
}

#[test]
fn invalid_flock_settings_are_rejected_up_front() {
    let config = FlockConfig {
        visibility: -1.0,
        ..FlockConfig::default()
    };
    let result = Simulation::initialize(Bounds::default(), [config]);
    assert!(matches!(result, Err(FlockError::InvalidConfiguration(_))));

    let mut sim = Simulation::initialize(Bounds::default(), [FlockConfig::default()]).unwrap();
    let bad = FlockConfig {
        max_speed: 0.0,
        ..FlockConfig::default()
    };
    assert!(sim.update_flock_config(FlockId(0), bad).is_err());
    assert_relative_eq!(sim.registry().config(FlockId(0)).unwrap().max_speed, 5.0);
}

#[test]
fn flocks_do_not_see_each_other() {
    let mut registry = FlockRegistry::new();
    let left = registry.create_flock(FlockConfig::default()).unwrap();
    let right = registry.create_flock(FlockConfig::default()).unwrap();
    let mut store = AgentStore::new();
    for (position, flock) in [(Vec3::ZERO, left), (Vec3::new(1.0, 0.0, 0.0), right)] {
        let index = store.append(position, Vec3::X, attributes(flock));
        registry.add_member(flock, index).unwrap();
    }

    TickScheduler::new().compute_steering(&mut store, &registry, &SimulationParams::deterministic(), 0);

    assert_eq!(store.directions()[0], Vec3::ZERO);
    assert_eq!(store.directions()[1], Vec3::ZERO);
}

#[test]
fn grid_search_survives_a_huge_time_step() {
    let run = |strategy: flocking::NeighborStrategy| {
        let params = SimulationParams {
            neighbor_strategy: strategy,
            ..SimulationParams::deterministic()
        };
        let mut sim = Simulation::with_params(Bounds::default(), params, [FlockConfig::default()]).unwrap();
        sim.spawn_agents(50, FlockId(0)).unwrap();
        sim.tick(1.0e13).unwrap();
        sim.tick(0.016).unwrap();
        sim.agent_snapshot()
    };

    let grid = run(flocking::NeighborStrategy::Grid);
    let brute = run(flocking::NeighborStrategy::BruteForce);
    assert_eq!(grid, brute);
}
