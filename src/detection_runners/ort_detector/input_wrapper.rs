use anyhow::Result;
use ndarray::{Array, IxDyn};

/// Model input or output, wrapper over [`Array<f32, IxDyn>`]
#[derive(Debug, Clone, Default)]
pub struct X(pub Array<f32, IxDyn>);

impl From<Array<f32, IxDyn>> for X {
    fn from(x: Array<f32, IxDyn>) -> Self {
        Self(x)
    }
}

impl From<Vec<f32>> for X {
    fn from(x: Vec<f32>) -> Self {
        Self(Array::from_vec(x).into_dyn())
    }
}

impl std::ops::Deref for X {
    type Target = Array<f32, IxDyn>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl X {
    pub fn from_shape_vec(shape: &[usize], xs: Vec<f32>) -> Result<Self> {
        Ok(Self::from(Array::from_shape_vec(shape, xs)?))
    }

    pub fn ndim(&self) -> usize {
        self.0.ndim()
    }
}

/// Ordered collection of named tensors, as fed to or returned by the engine.
#[derive(Debug, Clone, Default)]
pub struct Xs {
    names: Vec<String>,
    values: Vec<X>,
}

impl From<X> for Xs {
    fn from(x: X) -> Self {
        let mut xs = Self::new();
        xs.push(x);
        xs
    }
}

impl From<Vec<X>> for Xs {
    fn from(values: Vec<X>) -> Self {
        let names = (0..values.len()).map(|i| i.to_string()).collect();
        Self { names, values }
    }
}

impl std::ops::Index<usize> for Xs {
    type Output = X;

    fn index(&self, index: usize) -> &Self::Output {
        &self.values[index]
    }
}

impl IntoIterator for Xs {
    type Item = X;
    type IntoIter = std::vec::IntoIter<X>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl Xs {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push(&mut self, x: X) {
        self.names.push(self.values.len().to_string());
        self.values.push(x);
    }

    pub fn push_kv(&mut self, key: &str, x: X) -> Result<()> {
        if self.names.iter().any(|n| n == key) {
            anyhow::bail!("Duplicate tensor name: {key}");
        }
        self.names.push(key.to_string());
        self.values.push(x);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&X> {
        self.names.iter().position(|n| n == key).map(|i| &self.values[i])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_lookup_and_duplicates() {
        let mut xs = Xs::new();
        xs.push_kv("output0", X::from(vec![1., 2.])).unwrap();
        assert!(xs.push_kv("output0", X::from(vec![3.])).is_err());
        assert_eq!(xs.len(), 1);
        assert_eq!(xs.get("output0").unwrap().len(), 2);
        assert!(xs.get("missing").is_none());
        assert_eq!(xs[0].ndim(), 1);
    }
}
