use invaders_core::{
    Command, CollisionMask, EffectEvent, EffectKind, Event, GridPoint, ShapeCategory, ShapeId,
};
use invaders_world::{self as world, query, Config, Session, Shape};

fn tick(session: &mut Session, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(session, command, &mut events);
    events
}

fn player_bullet(serial: u32, origin: GridPoint) -> Shape {
    Shape::new(
        ShapeId::PlayerBullet(serial),
        vec![vec![3], vec![3]],
        origin,
        CollisionMask::shapes_only(),
    )
}

fn enemy_bullet(serial: u32, origin: GridPoint) -> Shape {
    Shape::new(
        ShapeId::EnemyBullet(serial),
        vec![vec![5]],
        origin,
        CollisionMask::shapes_only(),
    )
}

/// Drops an enemy bullet just above the tank body and ticks until it
/// connects.
fn hit_tank(session: &mut Session, serial: u32) -> Vec<Event> {
    session
        .add_to_canvas(enemy_bullet(serial, GridPoint::new(40, 76)))
        .expect("bullet registers");
    let mut events = tick(session, Command::TickParticles);
    events.extend(tick(session, Command::TickParticles));
    events
}

#[test]
fn shooting_an_enemy_scores_fifty_and_removes_both() {
    let mut session = Session::new(Config::default());
    session
        .add_to_canvas(player_bullet(50, GridPoint::new(3, 13)))
        .expect("bullet registers");

    let first = tick(&mut session, Command::TickParticles);
    assert!(first.is_empty(), "no contact on the approach tick");

    let second = tick(&mut session, Command::TickParticles);
    assert!(second.contains(&Event::ScoreChanged { score: 50 }));
    assert!(second.contains(&Event::EnemyDestroyed {
        id: ShapeId::Enemy { line: 0, slot: 0 },
        at: GridPoint::new(3, 10),
    }));

    assert_eq!(query::score(&session), 50);
    let enemies = query::shapes_in_category(&session, ShapeCategory::Enemy);
    assert_eq!(enemies.len(), 44);
    assert!(enemies
        .iter()
        .all(|snapshot| snapshot.id != ShapeId::Enemy { line: 0, slot: 0 }));
    assert!(query::shapes_in_category(&session, ShapeCategory::PlayerBullet).is_empty());

    assert_eq!(
        session.drain_effects(),
        vec![EffectEvent {
            at: GridPoint::new(3, 10),
            kind: EffectKind::EnemyExplosion,
        }]
    );
}

#[test]
fn hitting_the_tank_costs_a_life_and_respawns_it() {
    let mut session = Session::new(Config::default());

    let events = hit_tank(&mut session, 90);
    assert!(events.contains(&Event::LivesChanged { lives: 2 }));
    assert!(events.contains(&Event::TankDestroyed { at: GridPoint::new(40, 77) }));
    assert!(!events.contains(&Event::GameOver));

    assert_eq!(query::lives(&session), 2);
    assert!(!query::is_over(&session));

    let tank = query::shapes_in_category(&session, ShapeCategory::Tank);
    assert_eq!(tank.len(), 1);
    assert_eq!(tank[0].origin, GridPoint::new(40, 77));
    assert!(query::shapes_in_category(&session, ShapeCategory::EnemyBullet).is_empty());

    let effects = session.drain_effects();
    assert_eq!(
        effects,
        vec![EffectEvent {
            at: GridPoint::new(40, 77),
            kind: EffectKind::TankExplosion,
        }]
    );
}

#[test]
fn the_third_tank_hit_ends_the_session() {
    let mut session = Session::new(Config::default());

    let _ = hit_tank(&mut session, 91);
    let _ = hit_tank(&mut session, 92);
    assert_eq!(query::lives(&session), 1);
    assert!(!query::is_over(&session));

    let events = hit_tank(&mut session, 93);
    assert!(events.contains(&Event::LivesChanged { lives: 0 }));
    assert!(events.contains(&Event::GameOver));

    assert!(query::is_over(&session));
    // The tank still respawns; the pacing layer is what stops ticking.
    assert_eq!(
        query::shapes_in_category(&session, ShapeCategory::Tank).len(),
        1
    );
}

#[test]
fn a_base_loses_exactly_the_struck_cell() {
    let mut session = Session::new(Config::default());
    session
        .add_to_canvas(enemy_bullet(80, GridPoint::new(7, 63)))
        .expect("bullet registers");

    let _ = tick(&mut session, Command::TickParticles);
    let events = tick(&mut session, Command::TickParticles);
    assert!(events.contains(&Event::BaseDamaged {
        id: ShapeId::Base(0),
        at: GridPoint::new(7, 65),
    }));

    let bases = query::shapes_in_category(&session, ShapeCategory::Base);
    let base = bases
        .iter()
        .find(|snapshot| snapshot.id == ShapeId::Base(0))
        .expect("base survives the hit");
    assert_eq!(base.matrix[0][0], 0);
    assert_eq!(base.matrix[0][1], 4);
    let holes: usize = base
        .matrix
        .iter()
        .flatten()
        .filter(|&&cell| cell == 0)
        .count();
    // Six hollow cells were in the template; the hit added one more.
    assert_eq!(holes, 7);

    assert_eq!(
        session.drain_effects(),
        vec![EffectEvent {
            at: GridPoint::new(7, 65),
            kind: EffectKind::BaseHit,
        }]
    );
    assert!(query::shapes_in_category(&session, ShapeCategory::EnemyBullet).is_empty());
}

#[test]
fn a_base_is_removed_once_its_last_cell_clears() {
    let mut session = Session::new(Config::default());
    let _ = session.remove_from_canvas(ShapeId::Base(3));
    session
        .add_to_canvas(Shape::new(
            ShapeId::Base(3),
            vec![vec![4]],
            GridPoint::new(50, 50),
            CollisionMask::shapes_only(),
        ))
        .expect("pebble base registers");

    session
        .add_to_canvas(player_bullet(81, GridPoint::new(50, 52)))
        .expect("bullet registers");
    let _ = tick(&mut session, Command::TickParticles);
    let events = tick(&mut session, Command::TickParticles);

    assert!(events.contains(&Event::BaseDamaged {
        id: ShapeId::Base(3),
        at: GridPoint::new(50, 50),
    }));
    assert!(query::shapes_in_category(&session, ShapeCategory::Base)
        .iter()
        .all(|snapshot| snapshot.id != ShapeId::Base(3)));
}

#[test]
fn opposing_bullets_destroy_each_other() {
    let mut session = Session::new(Config::default());
    session
        .add_to_canvas(player_bullet(70, GridPoint::new(20, 51)))
        .expect("player bullet registers");
    session
        .add_to_canvas(enemy_bullet(71, GridPoint::new(20, 50)))
        .expect("enemy bullet registers");

    let _ = tick(&mut session, Command::TickParticles);

    assert!(query::shapes_in_category(&session, ShapeCategory::PlayerBullet).is_empty());
    assert!(query::shapes_in_category(&session, ShapeCategory::EnemyBullet).is_empty());
}

#[test]
fn no_two_shapes_share_a_cell_after_resolution() {
    let mut session = Session::new(Config::default());
    session
        .add_to_canvas(player_bullet(60, GridPoint::new(3, 13)))
        .expect("bullet registers");

    for _ in 0..3 {
        let _ = tick(&mut session, Command::TickParticles);

        let mut seen = std::collections::HashSet::new();
        for snapshot in query::shape_view(&session).iter() {
            for (row_index, row) in snapshot.matrix.iter().enumerate() {
                for (column_index, &code) in row.iter().enumerate() {
                    if code == 0 {
                        continue;
                    }
                    let cell = (
                        snapshot.origin.column() + column_index as i32,
                        snapshot.origin.row() + row_index as i32,
                    );
                    assert!(seen.insert(cell), "cell {cell:?} claimed twice");
                }
            }
        }
    }
}
