//! orbspace - orbital spaces and basis transformations of dense tensors
//!
//! A space is either an identity (atomic-orbital) space or a space derived
//! from a parent by a change-of-basis matrix `C` (rows: parent, columns:
//! this space). Chains of derived spaces always end at one identity root.
//! Moving a tensor mode between two spaces walks that chain, and several
//! modes are moved together in the order that keeps intermediates small.
//!
//! # Architecture
//!
//! ```text
//! Level 1: Spaces (space module)
//!     → Space, chain resolution (path, chain, root)
//!
//! Level 2: Planning and execution (transform module)
//!     → TransformRequest → TransformPlan → Transformer
//!     → CostModel / Schedule decide the hop order
//!
//! Level 3: Tensor backend (backend, contract modules)
//!     → GemmBackend (faer matmul), NaiveBackend (loops)
//! ```
//!
//! # Example
//!
//! ```
//! use orbspace::{DenseTensor, Space, transform};
//!
//! // AO space of 3 functions and an MO space of 2 orbitals
//! let ao = Space::<f64>::identity(3);
//! let c = DenseTensor::from_rows(&[
//!     vec![0.5, 0.1],
//!     vec![0.5, -0.2],
//!     vec![0.0, 0.9],
//! ])
//! .unwrap();
//! let mo = Space::derived(c, &ao).unwrap();
//!
//! // an AO matrix (e.g. a Fock matrix) moved into the MO basis on both modes
//! let f_ao = DenseTensor::<f64>::identity(3);
//! let f_mo = transform(f_ao, &[ao.clone(), ao], &[mo.clone(), mo]).unwrap();
//! assert_eq!(f_mo.shape(), &[2, 2]);
//! ```

pub mod backend;
pub mod config;
pub mod contract;
pub mod error;
pub mod hierarchical;
pub mod operations;
pub mod random;
pub mod scalar;
pub mod space;
pub mod strides;
pub mod tensor;
pub mod transform;

pub use backend::{GemmBackend, NaiveBackend, TensorBackend};
pub use config::{ConfigError, TransformConfig};
pub use error::{SpaceError, TensorError};
pub use hierarchical::{DependentSpace, TensorOfTensors, tot_transform};
pub use scalar::{Scalar, c64};
pub use space::{Flavor, Hop, HopDirection, Space, SpaceKind, path};
pub use tensor::{DenseTensor, Tensor};
pub use transform::{
    CostModel, HopSelector, Schedule, TransformPlan, TransformRequest, Transformer, transform,
    transform_from_root, transform_to_root,
};
