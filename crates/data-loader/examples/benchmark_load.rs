use data_loader::DataStore;
use std::path::Path;
use std::time::Instant;

fn main() {
    let data_dir = Path::new("data");

    println!("Loading movie catalog and similarity matrix...\n");

    let start = Instant::now();
    let store = DataStore::load_from_dir(data_dir)
        .expect("Failed to load dataset");
    let elapsed = start.elapsed();

    let (movies, size) = store.counts();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Movies: {}", movies);
    println!("Matrix: {}x{}", size, size);
    println!("\nPerformance: {:.0} scores/second",
             (size * size) as f64 / elapsed.as_secs_f64());
}
