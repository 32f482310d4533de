//! Two Gaussian blobs, clustered with both affinity modes.
//!
//! ```text
//! RUST_LOG=debug cargo run --example two_blobs
//! ```

use ndarray::Array2;
use rand::prelude::*;
use rand_distr::Normal;
use spectra::metrics::{ari, silhouette_score};
use spectra::{AffinityMode, SpectralClustering};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let per_blob = 30;
    let mut rng = StdRng::seed_from_u64(2024);
    let noise = Normal::new(0.0, 1.0)?;
    let mut points = Array2::zeros((2 * per_blob, 2));
    let mut truth = Vec::with_capacity(2 * per_blob);
    for (c, center) in [0.0, 10.0].into_iter().enumerate() {
        for i in 0..per_blob {
            let row = c * per_blob + i;
            points[[row, 0]] = center + noise.sample(&mut rng);
            points[[row, 1]] = center + noise.sample(&mut rng);
            truth.push(c);
        }
    }

    for mode in [
        AffinityMode::Rbf { gamma: Some(1.0) },
        AffinityMode::Knn { n_neighbors: 5 },
    ] {
        let fit = SpectralClustering::new(2).affinity(mode).seed(7).fit(&points)?;
        println!("{mode:?}");
        println!("  components : {}", fit.n_components);
        println!("  eigenvalues: {:.3e}", fit.eigenpairs.values);
        println!("  inertia    : {:.4e}", fit.inertia);
        println!("  ARI        : {:.3}", ari(&fit.labels, &truth));
        println!("  silhouette : {:.3}", silhouette_score(&points, &fit.labels)?);
        for warning in &fit.warnings {
            println!("  warning    : {warning}");
        }
    }
    Ok(())
}
