//! Carves a random cave, then runs each search variant on it and prints the
//! routes. Set `RUST_LOG=debug` (or `trace`) to see the engine's logging.

use std::collections::HashSet;
use std::sync::Arc;

use cellpath_core::{Dims, MoveMask, Point, TerrainModel, TerrainSource};
use cellpath_paths::{Path, Pather, Unsolved};
use rand::{Rng, RngExt};

const WIDTH: usize = 64;
const HEIGHT: usize = 24;

const WALK: MoveMask = MoveMask::class(0);
const SWIM: MoveMask = MoveMask::class(1);

#[derive(Clone, Copy, PartialEq)]
enum Tile {
    Rock,
    Floor,
    Mud,
    Water,
}

struct Cave {
    dims: Dims,
    tiles: Vec<Tile>,
}

impl Cave {
    /// Random walk from the center until `fill` of the area is open.
    fn carve(rng: &mut impl Rng, fill: f64) -> Self {
        let dims = Dims::new(WIDTH, HEIGHT);
        let mut tiles = vec![Tile::Rock; dims.len()];
        let interior = dims.interior();
        let target = (interior.len() as f64 * fill) as usize;
        let mut p = Point::new(WIDTH as i32 / 2, HEIGHT as i32 / 2);
        let mut open = 0;
        while open < target {
            let Some(i) = dims.index(p) else { break };
            if tiles[i] == Tile::Rock {
                tiles[i] = match rng.random_range(0..20) {
                    0..=2 => Tile::Mud,
                    3 => Tile::Water,
                    _ => Tile::Floor,
                };
                open += 1;
            }
            let next = p.neighbors_8()[rng.random_range(0..4)];
            if next.in_range(&interior) {
                p = next;
            }
        }
        Self { dims, tiles }
    }

    fn tile(&self, p: Point) -> Tile {
        self.dims.index(p).map_or(Tile::Rock, |i| self.tiles[i])
    }

    fn random_floor(&self, rng: &mut impl Rng) -> Option<usize> {
        (0..1000)
            .map(|_| {
                Point::new(
                    rng.random_range(1..WIDTH as i32 - 1),
                    rng.random_range(1..HEIGHT as i32 - 1),
                )
            })
            .find(|&p| self.tile(p) == Tile::Floor)
            .and_then(|p| self.dims.index(p))
    }
}

impl TerrainSource for Cave {
    fn mask(&self, p: Point) -> MoveMask {
        match self.tile(p) {
            Tile::Rock => MoveMask::NONE,
            Tile::Water => SWIM,
            Tile::Floor | Tile::Mud => WALK | SWIM,
        }
    }

    fn cost(&self, p: Point) -> f32 {
        match self.tile(p) {
            Tile::Mud => 4.0,
            _ => 1.0,
        }
    }
}

fn render(cave: &Cave, path: &Path) {
    let on_path: HashSet<usize> = path.cells().iter().copied().collect();
    for y in 0..HEIGHT as i32 {
        let row: String = (0..WIDTH as i32)
            .map(|x| {
                let p = Point::new(x, y);
                let i = cave.dims.index(p).unwrap_or(0);
                if i == path.start() {
                    '@'
                } else if i == path.goal() {
                    '>'
                } else if on_path.contains(&i) {
                    '*'
                } else {
                    match cave.tile(p) {
                        Tile::Rock => '#',
                        Tile::Floor => '.',
                        Tile::Mud => ',',
                        Tile::Water => '~',
                    }
                }
            })
            .collect();
        println!("{row}");
    }
}

fn report(label: &str, cave: &Cave, result: Result<Path, Unsolved>) {
    match result {
        Ok(path) => {
            println!("{label}: {} steps, cost {:.2}", path.len() - 1, path.cost());
            render(cave, &path);
        }
        Err(e) => println!("{label}: {e}"),
    }
    println!();
}

fn main() {
    env_logger::init();

    let mut rng = rand::rng();
    let cave = Cave::carve(&mut rng, 0.45);
    let terrain = Arc::new(TerrainModel::sample(WIDTH, HEIGHT, &cave));

    let mut pather = match Pather::configure(WIDTH, HEIGHT, WIDTH * HEIGHT) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("cave: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = pather.set_terrain(terrain, WALK) {
        eprintln!("cave: {e}");
        std::process::exit(1);
    }

    let picks: Vec<usize> = (0..4).filter_map(|_| cave.random_floor(&mut rng)).collect();
    let [start, end, a, b] = picks[..] else {
        eprintln!("cave: not enough floor to pick endpoints");
        std::process::exit(1);
    };

    report("walk", &cave, pather.find_path(start, end));
    report("nearest of three", &cave, pather.find_path_to_any(start, &[end, a, b], 0.0));
    report("avoiding mud", &cave, pather.find_path_to_any(start, &[end], 2.0));
    match pather.find_path_to_priority(start, &[end, a, b]) {
        Ok(found) => report(&format!("priority (rank {})", found.rank), &cave, Ok(found.path)),
        Err(e) => report("priority", &cave, Err(e)),
    }
    report("within 4 of the end", &cave, pather.find_path_to_radius(start, end, 4));

    if pather.set_movement(SWIM).is_ok() {
        report("swim", &cave, pather.find_path(start, end));
    }

    let stats = pather.last_run();
    log::info!(
        "last run: epoch {}, expanded {}, pushed {}",
        stats.epoch,
        stats.expanded,
        stats.pushed
    );
}
