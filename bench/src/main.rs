use std::sync::Arc;
use std::time::{Duration, Instant};

use actor_link_core::{MemoryGraph, PathFinder, SearchConfig};

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();

    let mode = args.get(1).map(|s| s.as_str()).unwrap_or("all");
    let people = parse_people(args.get(2).map(|s| s.as_str()));
    let latency_us: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0);

    if mode == "help" || mode == "--help" {
        println!("Usage: actor-link-bench [mode] [people] [latency_us]");
        println!();
        println!("Modes:");
        println!("  all       Run all generators and benchmark each (default)");
        println!("  chain     People linked in a line by two-person movies (deep paths)");
        println!("  random    Uniform random casts");
        println!("  hubs      Scale-free credits: a few prolific actors in most movies");
        println!("  barbell   Two dense studios joined by a thin chain of movies");
        println!();
        println!("Default people: 200000. latency_us simulates provider round trips.");
        return;
    }

    println!("actor-link-bench");
    println!("================");
    println!();

    let generators: Vec<(&str, fn(u64) -> MemoryGraph)> = match mode {
        "chain" => vec![("Chain", gen_chain)],
        "random" => vec![("Random casts", gen_random)],
        "hubs" => vec![("Hub-heavy (preferential attachment)", gen_hubs)],
        "barbell" => vec![("Barbell (studio-bridge-studio)", gen_barbell)],
        "all" => vec![
            ("Chain", gen_chain as fn(u64) -> MemoryGraph),
            ("Random casts", gen_random),
            ("Hub-heavy (preferential attachment)", gen_hubs),
            ("Barbell (studio-bridge-studio)", gen_barbell),
        ],
        _ => {
            eprintln!("Unknown mode: {}. Use --help for options.", mode);
            return;
        }
    };

    for (name, generator) in generators {
        run_benchmark(name, generator, people, Duration::from_micros(latency_us)).await;
    }
}

/// People count argument; every generator needs two distinct endpoints.
fn parse_people(arg: Option<&str>) -> u64 {
    arg.and_then(|s| s.parse().ok()).unwrap_or(200_000).max(2)
}

async fn run_benchmark(name: &str, generator: fn(u64) -> MemoryGraph, people: u64, latency: Duration) {
    println!("--- {} ---", name);
    println!("Target: {} people", people);

    let t = Instant::now();
    let mut graph = generator(people);
    let gen_time = t.elapsed();
    println!(
        "Generated in {:.2}s: {} people, {} movies, {} credits, ~{:.0}MB",
        gen_time.as_secs_f64(),
        graph.person_count(),
        graph.movie_count(),
        graph.edge_count(),
        graph.memory_usage() as f64 / 1_048_576.0
    );
    if !latency.is_zero() {
        graph = graph.with_latency(latency);
    }
    let graph = Arc::new(graph);

    // Person 0 to the last person: typically the far end of the structure.
    let far = (graph.person_count() as u64).saturating_sub(1);

    println!();
    println!(
        "{:>10} {:>8} {:>10} {:>10} {:>10} {:>10}",
        "max_edges", "cache", "edges", "fetched", "cached", "time"
    );
    println!(
        "{:->10} {:->8} {:->10} {:->10} {:->10} {:->10}",
        "", "", "", "", "", ""
    );

    for max_edges in [4u32, 8, 12, 20, 40] {
        let finder = PathFinder::new(graph.clone(), SearchConfig::default());
        let mut found = false;
        for pass in ["cold", "warm"] {
            let fetched_before = graph.fetch_count();
            let t = Instant::now();
            let result = finder.find_path(0, far, max_edges).await;
            let elapsed = t.elapsed();

            let edges = match &result {
                Ok(Some(path)) => {
                    found = true;
                    path.edge_count().to_string()
                }
                Ok(None) => "none".to_string(),
                Err(e) => format!("error: {}", e),
            };
            println!(
                "{:>10} {:>8} {:>10} {:>10} {:>10} {:>8.1}ms",
                max_edges,
                pass,
                edges,
                graph.fetch_count() - fetched_before,
                finder.cache_stats().entries,
                elapsed.as_secs_f64() * 1000.0
            );
        }
        // Larger limits cannot do better once a path is found.
        if found {
            break;
        }
    }
    println!();
}

// ---------------------------------------------------------------------------
// Generators: O(people + credits), single-threaded and deterministic.
// Movie ids start at MOVIE_BASE so they never collide with person ids in output.
// ---------------------------------------------------------------------------

const MOVIE_BASE: u64 = 10_000_000;

/// Simple LCG for deterministic, fast pseudo-random numbers.
struct FastRng(u64);

impl FastRng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next(&mut self, max: u64) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.0 >> 33) % max
    }
}

fn with_people(people: u64, movies: u64) -> MemoryGraph {
    let mut graph = MemoryGraph::with_capacity(people as usize, movies as usize);
    for p in 0..people {
        graph.add_person(p, format!("Person {}", p));
    }
    graph
}

/// Person i and i+1 co-star in movie i. Path length grows linearly: worst
/// case for depth, best case for fan-out.
fn gen_chain(people: u64) -> MemoryGraph {
    let mut graph = with_people(people, people);
    for i in 0..people.saturating_sub(1) {
        graph.add_credit(i, MOVIE_BASE + i);
        graph.add_credit(i + 1, MOVIE_BASE + i);
    }
    graph
}

/// Uniform random casts of 8 people per movie, one movie per 4 people.
/// Baseline topology with no structure.
fn gen_random(people: u64) -> MemoryGraph {
    let movies = (people / 4).max(1);
    let mut graph = with_people(people, movies);
    let mut rng = FastRng::new(54321);

    for m in 0..movies {
        for _ in 0..8 {
            graph.add_credit(rng.next(people), MOVIE_BASE + m);
        }
    }
    graph
}

/// Preferential attachment via credit sampling (O(credits), not O(n²)).
///
/// Each movie casts some members by picking a random earlier credit and
/// reusing its person, so prolific actors keep getting cast. Produces the
/// skewed degree distribution real filmographies have.
fn gen_hubs(people: u64) -> MemoryGraph {
    let movies = (people / 3).max(1);
    let cast_size = 6u64;
    let mut graph = with_people(people, movies);
    let mut rng = FastRng::new(12345);

    // Person of every credit so far, for degree-proportional sampling.
    let mut credited: Vec<u64> = Vec::with_capacity((movies * cast_size) as usize);
    let mut next_newcomer = 0u64;

    for m in 0..movies {
        for slot in 0..cast_size {
            let person = if slot < 2 && !credited.is_empty() {
                credited[rng.next(credited.len() as u64) as usize]
            } else if next_newcomer < people {
                next_newcomer += 1;
                next_newcomer - 1
            } else {
                rng.next(people)
            };
            graph.add_credit(person, MOVIE_BASE + m);
            credited.push(person);
        }
    }
    graph
}

/// Two dense studios connected by a chain of ~10 two-person movies.
///
/// Worst case for "find path through a bottleneck": both searches flood
/// their own studio before they reach the bridge.
fn gen_barbell(people: u64) -> MemoryGraph {
    let bridge_len = 10u64.min(people / 2);
    let studio = (people - bridge_len) / 2;
    let movies_per_studio = (studio / 2).max(1);
    let mut graph = with_people(people, movies_per_studio * 2 + bridge_len);
    let mut rng = FastRng::new(99999);

    // Studio A: people 0..studio
    for m in 0..movies_per_studio {
        for _ in 0..10 {
            graph.add_credit(rng.next(studio.max(1)), MOVIE_BASE + m);
        }
    }

    // Bridge: chain from the last person of A to the first person of B
    let bridge_start = studio;
    let mut next_movie = MOVIE_BASE + movies_per_studio;
    let mut prev = studio.saturating_sub(1);
    for i in 0..bridge_len {
        let person = bridge_start + i;
        graph.add_credit(prev, next_movie);
        graph.add_credit(person, next_movie);
        next_movie += 1;
        prev = person;
    }

    // Studio B: everyone after the bridge
    let b_start = bridge_start + bridge_len;
    let b_size = people - b_start;
    graph.add_credit(prev, next_movie);
    graph.add_credit(b_start, next_movie);
    next_movie += 1;
    for m in 0..movies_per_studio {
        for _ in 0..10 {
            graph.add_credit(b_start + rng.next(b_size.max(1)), next_movie + m);
        }
    }
    graph
}
