//! Per-bus classification and the resulting Jacobian row layout.

/// Role of a bus in the power-flow problem.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusClass {
    Slack,
    Pv,
    Pq,
    /// Hosts a dynamic model; rows follow its current voltage role.
    Dynamic,
}

/// What the classifier needs to know about one bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusFlags {
    pub slack: bool,
    pub dynamic: bool,
    pub magnitude_static: bool,
    pub angle_static: bool,
}

/// Row (and column) positions of each bus's unknowns, by matrix index.
///
/// A bus owns an angle row when its angle is free and a magnitude row when
/// its magnitude is free; the slack bus owns none. Angle rows come first
/// within a bus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JacobianLayout {
    classes: Vec<BusClass>,
    angle_rows: Vec<Option<usize>>,
    magnitude_rows: Vec<Option<usize>>,
    dim: usize,
}

impl JacobianLayout {
    pub fn build(flags: &[BusFlags]) -> Self {
        let mut classes = Vec::with_capacity(flags.len());
        let mut angle_rows = Vec::with_capacity(flags.len());
        let mut magnitude_rows = Vec::with_capacity(flags.len());
        let mut dim = 0;

        for f in flags {
            let class = if f.slack {
                BusClass::Slack
            } else if f.dynamic {
                BusClass::Dynamic
            } else if f.magnitude_static {
                BusClass::Pv
            } else {
                BusClass::Pq
            };
            classes.push(class);

            let mut next_row = |owned: bool| {
                owned.then(|| {
                    dim += 1;
                    dim - 1
                })
            };
            let free = !f.slack;
            angle_rows.push(next_row(free && !f.angle_static));
            magnitude_rows.push(next_row(free && !f.magnitude_static));
        }

        Self {
            classes,
            angle_rows,
            magnitude_rows,
            dim,
        }
    }

    /// Jacobian dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn class(&self, index: usize) -> BusClass {
        self.classes[index]
    }

    pub fn classes(&self) -> &[BusClass] {
        &self.classes
    }

    pub fn angle_row(&self, index: usize) -> Option<usize> {
        self.angle_rows[index]
    }

    pub fn magnitude_row(&self, index: usize) -> Option<usize> {
        self.magnitude_rows[index]
    }
}
