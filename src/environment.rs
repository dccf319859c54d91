//! The training environment: owns the instance table and serves one
//! `(state, target)` pair at a time. Instances are presented in table order
//! and wrap around; any shuffling or epoch bookkeeping happens outside.
use crate::schema::DataSchema;

#[derive(Clone, Debug)]
pub struct Environment {
    instances: Vec<Vec<f64>>,
    targets: Vec<f64>,
    cursor: usize,
    pub schema: DataSchema,
}

impl Environment {
    pub fn new(instances: Vec<Vec<f64>>, targets: Vec<f64>, schema: DataSchema) -> Self {
        Self {
            instances,
            targets,
            cursor: 0,
            schema,
        }
    }

    /// The instance the cursor currently points at.
    pub fn current_instance(&self) -> (&[f64], f64) {
        (&self.instances[self.cursor], self.targets[self.cursor])
    }

    /// Moves the cursor to the next instance, wrapping at the end.
    pub fn advance(&mut self) {
        self.cursor = (self.cursor + 1) % self.instances.len();
    }

    pub fn num_instances(&self) -> usize {
        self.instances.len()
    }

    pub fn instances(&self) -> &[Vec<f64>] {
        &self.instances
    }

    pub fn targets(&self) -> &[f64] {
        &self.targets
    }
}
