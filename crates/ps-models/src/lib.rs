//! Bus injection models for powersim.
//!
//! Every bus hosts exactly one [`InjectionModel`]. Static models (loads,
//! PV generators, passive shunts) are pure functions of the bus voltage;
//! dynamic models (synchronous generators, Kuramoto oscillators) also
//! expose a [`DynamicModel`] view with their own state and derivatives.

pub mod constant_power;
pub mod constant_voltage;
pub mod context;
pub mod error;
pub mod kuramoto;
pub mod passive;
pub mod synchronous;
pub mod traits;

pub use constant_power::ConstantPower;
pub use constant_voltage::ConstantVoltage;
pub use context::{BusContext, Neighbor};
pub use error::{ModelError, ModelResult};
pub use kuramoto::{KuramotoOscillator, KuramotoParams};
pub use passive::PassiveShunt;
pub use synchronous::{SynchronousGenerator, SynchronousGeneratorParams};
pub use traits::{
    DynamicModel, InjectionModel, ModelPhase, PowerSensitivities, VoltageRole,
};
