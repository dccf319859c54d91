//! A supervised rule-learning classifier system (eLCS) for Rust.
//!
//! The model evolves a population of condition/phenotype rules through an
//! interleaved match, cover, update, genetic-algorithm and deletion loop.
//! There are three main elements to this approach:
//! * The [Classifier](crate::classifier::Classifier) (a single rule with its learned statistics)
//! * The [Population](crate::population::Population) (the bounded rule set and its transient match/correct views)
//! * The [Elcs](crate::model::Elcs) model (the training loop and the inference entry points)
//!
//! Discrete and continuous attributes can be mixed per column, attribute
//! values may be missing (`f64::NAN`), and the target phenotype is either a
//! class label or a continuous value, detected from the data.
//!
//! ## Quick Usage
//!
//! ```rust
//! use elcs::prelude::*;
//!
//! // the training table: XOR of two binary attributes
//! let x = vec![
//!     vec![0.0, 0.0],
//!     vec![0.0, 1.0],
//!     vec![1.0, 0.0],
//!     vec![1.0, 1.0],
//! ];
//! let y = vec![0.0, 1.0, 1.0, 0.0];
//!
//! let mut model = Elcs::builder()
//!     .with_learning_iterations(1000)     // training cycles over the table
//!     .with_max_population_size(200)      // microclassifier bound
//!     .with_random_seed(1)                // reproducible run
//!     .build()
//!     .unwrap();
//!
//! model.fit(&x, &y).unwrap();
//! let predictions = model.predict(&x).unwrap();
//! assert_eq!(predictions.len(), 4);
//! ```

pub mod classifier;
pub mod environment;
pub mod errors;
pub mod model;
pub mod population;
pub mod prediction;
pub mod prelude;
pub mod schema;
