/// Cluster center: categorical modes plus numerical means
#[derive(Debug, Clone, PartialEq)]
pub struct Prototype {
    pub categorical: Vec<usize>,
    pub numeric: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct Fit {
    pub labels: Vec<usize>,
    pub prototypes: Vec<Prototype>,
    pub iterations: usize,
    /// Sum of each row's dissimilarity to its prototype
    pub cost: f64,
}
