//! Input/output shapes of adapter operations.
//!
//! `Batch` carries the scalar-vs-sequence shape through an operation so the
//! output always mirrors the input. `Input` is the resource-or-mapping union
//! resolved once per item before anything executes for that item.

use crate::model::mapping::FieldMapping;
use crate::model::resource::Resource;

/// One item or an ordered sequence of items.
#[derive(Debug, Clone, PartialEq)]
pub enum Batch<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> Batch<T> {
    pub fn is_many(&self) -> bool {
        matches!(self, Self::Many(_))
    }

    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The single item, or `None` for a sequence.
    pub fn into_one(self) -> Option<T> {
        match self {
            Self::One(item) => Some(item),
            Self::Many(_) => None,
        }
    }

    /// All items in order; a scalar becomes a one-element vector.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        }
    }

    /// Maps every item in order, stopping at the first error.
    pub fn try_map<U, E>(self, mut f: impl FnMut(T) -> Result<U, E>) -> Result<Batch<U>, E> {
        match self {
            Self::One(item) => f(item).map(Batch::One),
            Self::Many(items) => items
                .into_iter()
                .map(f)
                .collect::<Result<Vec<_>, _>>()
                .map(Batch::Many),
        }
    }
}

/// A typed resource or a plain mapping to be coerced through the scheme.
#[derive(Debug)]
pub enum Input<R> {
    Resource(R),
    Mapping(FieldMapping),
}

/// Owned input for create/update.
pub type ResourceInput = Input<Resource>;
/// Borrowed input for delete, so the caller keeps the frozen resource.
pub type DeleteInput<'r> = Input<&'r mut Resource>;

impl From<Resource> for Input<Resource> {
    fn from(value: Resource) -> Self {
        Self::Resource(value)
    }
}

impl<'r> From<&'r mut Resource> for Input<&'r mut Resource> {
    fn from(value: &'r mut Resource) -> Self {
        Self::Resource(value)
    }
}

impl<R> From<FieldMapping> for Input<R> {
    fn from(value: FieldMapping) -> Self {
        Self::Mapping(value)
    }
}

impl<R> From<Input<R>> for Batch<Input<R>> {
    fn from(value: Input<R>) -> Self {
        Self::One(value)
    }
}

impl<R> From<Vec<Input<R>>> for Batch<Input<R>> {
    fn from(value: Vec<Input<R>>) -> Self {
        Self::Many(value)
    }
}

impl<R> From<FieldMapping> for Batch<Input<R>> {
    fn from(value: FieldMapping) -> Self {
        Self::One(Input::Mapping(value))
    }
}

impl<R> From<Vec<FieldMapping>> for Batch<Input<R>> {
    fn from(value: Vec<FieldMapping>) -> Self {
        Self::Many(value.into_iter().map(Input::Mapping).collect())
    }
}

impl From<Resource> for Batch<ResourceInput> {
    fn from(value: Resource) -> Self {
        Self::One(Input::Resource(value))
    }
}

impl From<Vec<Resource>> for Batch<ResourceInput> {
    fn from(value: Vec<Resource>) -> Self {
        Self::Many(value.into_iter().map(Input::Resource).collect())
    }
}

impl<'r> From<&'r mut Resource> for Batch<DeleteInput<'r>> {
    fn from(value: &'r mut Resource) -> Self {
        Self::One(Input::Resource(value))
    }
}

impl<'r> From<Vec<&'r mut Resource>> for Batch<DeleteInput<'r>> {
    fn from(value: Vec<&'r mut Resource>) -> Self {
        Self::Many(value.into_iter().map(Input::Resource).collect())
    }
}

impl<'r> From<&'r mut [Resource]> for Batch<DeleteInput<'r>> {
    fn from(value: &'r mut [Resource]) -> Self {
        Self::Many(value.iter_mut().map(Input::Resource).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::Batch;

    #[test]
    fn try_map_preserves_shape_and_order() {
        let one = Batch::One(2).try_map(|v| Ok::<_, ()>(v * 10)).unwrap();
        assert_eq!(one, Batch::One(20));

        let many = Batch::Many(vec![1, 2, 3])
            .try_map(|v| Ok::<_, ()>(v + 1))
            .unwrap();
        assert_eq!(many, Batch::Many(vec![2, 3, 4]));
    }

    #[test]
    fn try_map_stops_at_first_error() {
        let mut seen = Vec::new();
        let err = Batch::Many(vec![1, 2, 3])
            .try_map(|v| {
                seen.push(v);
                if v == 2 {
                    Err("stop")
                } else {
                    Ok(v)
                }
            })
            .unwrap_err();
        assert_eq!(err, "stop");
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn empty_sequence_stays_a_sequence() {
        let batch: Batch<u8> = Batch::Many(Vec::new());
        assert!(batch.is_many());
        assert!(batch.is_empty());
    }
}
