//! The QBasic array object: a typed flat store with per-dimension bases.

use crate::error::RuntimeError;
use crate::types::{DimSpec, TypeSpec};
use crate::value::Value;

#[derive(Debug)]
pub struct QbArray {
    element: TypeSpec,
    dims: Vec<DimSpec>,
    data: Vec<Value>,
}

impl QbArray {
    /// Build an array with the given element type and inclusive bounds,
    /// filled with the element type's default value.
    pub fn new(element: TypeSpec, dims: Vec<DimSpec>) -> Result<Self, RuntimeError> {
        if dims.is_empty() {
            return Err(RuntimeError::new("array must have at least one dimension"));
        }
        let mut len: usize = 1;
        for dim in &dims {
            if dim.upper < dim.lower {
                return Err(RuntimeError::new(format!(
                    "invalid array bounds {} TO {}",
                    dim.lower, dim.upper
                )));
            }
            len *= (dim.upper - dim.lower + 1) as usize;
        }
        let data = vec![Value::default_for(&element); len];
        Ok(QbArray {
            element,
            dims,
            data,
        })
    }

    pub fn element(&self) -> &TypeSpec {
        &self.element
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    pub fn type_spec(&self) -> TypeSpec {
        TypeSpec::Array {
            element: Box::new(self.element.clone()),
            dims: self.dims.clone(),
        }
    }

    /// Lower bound of the 1-based dimension `dim`.
    pub fn lbound(&self, dim: usize) -> Result<i64, RuntimeError> {
        self.dim_spec(dim).map(|d| d.lower)
    }

    /// Upper bound of the 1-based dimension `dim`.
    pub fn ubound(&self, dim: usize) -> Result<i64, RuntimeError> {
        self.dim_spec(dim).map(|d| d.upper)
    }

    fn dim_spec(&self, dim: usize) -> Result<&DimSpec, RuntimeError> {
        if dim < 1 || dim > self.dims.len() {
            return Err(RuntimeError::new("Subscript out of range"));
        }
        Ok(&self.dims[dim - 1])
    }

    /// Row-major flat index with per-dimension base adjustment.
    fn flat_index(&self, indices: &[i64]) -> Result<usize, RuntimeError> {
        if indices.len() != self.dims.len() {
            return Err(RuntimeError::new("Wrong number of dimensions"));
        }
        let mut index: usize = 0;
        for (idx, dim) in indices.iter().zip(&self.dims) {
            if *idx < dim.lower || *idx > dim.upper {
                return Err(RuntimeError::new("Subscript out of range"));
            }
            let extent = (dim.upper - dim.lower + 1) as usize;
            index = index * extent + (idx - dim.lower) as usize;
        }
        Ok(index)
    }

    pub fn get(&self, indices: &[i64]) -> Result<Value, RuntimeError> {
        let index = self.flat_index(indices)?;
        Ok(self.data[index].clone())
    }

    /// Store a value, coerced to the element type.
    pub fn set(&mut self, indices: &[i64], value: &Value) -> Result<(), RuntimeError> {
        let index = self.flat_index(indices)?;
        self.data[index] = value.coerce_to(&self.element)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array_2d() -> QbArray {
        QbArray::new(
            TypeSpec::Integer,
            vec![DimSpec::new(1, 3), DimSpec::new(0, 2)],
        )
        .unwrap()
    }

    #[test]
    fn new_array_holds_defaults() {
        let arr = array_2d();
        assert!(matches!(arr.get(&[1, 0]).unwrap(), Value::Integer(0)));
        assert!(matches!(arr.get(&[3, 2]).unwrap(), Value::Integer(0)));
    }

    #[test]
    fn set_then_get_round_trips() {
        let mut arr = array_2d();
        arr.set(&[2, 1], &Value::Integer(42)).unwrap();
        assert!(matches!(arr.get(&[2, 1]).unwrap(), Value::Integer(42)));
        assert!(matches!(arr.get(&[1, 1]).unwrap(), Value::Integer(0)));
    }

    #[test]
    fn set_coerces_to_element_type() {
        let mut arr = array_2d();
        arr.set(&[1, 0], &Value::Single(2.7)).unwrap();
        assert!(matches!(arr.get(&[1, 0]).unwrap(), Value::Integer(3)));
    }

    #[test]
    fn out_of_range_index_errors() {
        let arr = array_2d();
        assert!(arr.get(&[0, 0]).is_err());
        assert!(arr.get(&[4, 0]).is_err());
        assert!(arr.get(&[1, 3]).is_err());
    }

    #[test]
    fn wrong_arity_errors() {
        let arr = array_2d();
        assert!(arr.get(&[1]).is_err());
        assert!(arr.get(&[1, 1, 1]).is_err());
    }

    #[test]
    fn bounds_are_one_based_by_dimension() {
        let arr = array_2d();
        assert_eq!(arr.lbound(1).unwrap(), 1);
        assert_eq!(arr.ubound(1).unwrap(), 3);
        assert_eq!(arr.lbound(2).unwrap(), 0);
        assert_eq!(arr.ubound(2).unwrap(), 2);
    }

    #[test]
    fn bound_dim_out_of_range_errors() {
        let arr = array_2d();
        assert!(arr.lbound(0).is_err());
        assert!(arr.lbound(3).is_err());
        assert!(arr.ubound(3).is_err());
    }

    #[test]
    fn inverted_bounds_rejected() {
        assert!(QbArray::new(TypeSpec::Single, vec![DimSpec::new(5, 2)]).is_err());
    }
}
