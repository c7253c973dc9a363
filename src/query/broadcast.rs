//! Single-or-many query arguments.
//!
//! Query helpers accept either one node or a list of nodes for every
//! position. [`IntoCandidates`] turns both into a candidate list, and
//! [`cartesian`] walks every combination in argument order, so the first
//! candidate of the first argument is tried first.

use oxrdf::{
    BlankNode, BlankNodeRef, NamedNode, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Term,
    TermRef,
};

/// Conversion of a query argument into the list of nodes it stands for.
pub trait IntoCandidates<T> {
    fn into_candidates(self) -> Vec<T>;
}

macro_rules! single_candidate {
    ($target:ty: $($source:ty => |$v:ident| $convert:expr),+ $(,)?) => {
        $(
            impl IntoCandidates<$target> for $source {
                fn into_candidates(self) -> Vec<$target> {
                    let $v = self;
                    vec![$convert]
                }
            }
        )+
    };
}

single_candidate!(NamedNode:
    NamedNode => |v| v,
    &NamedNode => |v| v.clone(),
    NamedNodeRef<'_> => |v| v.into_owned(),
);

single_candidate!(NamedOrBlankNode:
    NamedOrBlankNode => |v| v,
    &NamedOrBlankNode => |v| v.clone(),
    NamedOrBlankNodeRef<'_> => |v| v.into_owned(),
    NamedNode => |v| v.into(),
    &NamedNode => |v| v.clone().into(),
    NamedNodeRef<'_> => |v| v.into_owned().into(),
    BlankNode => |v| v.into(),
    &BlankNode => |v| v.clone().into(),
    BlankNodeRef<'_> => |v| v.into_owned().into(),
);

single_candidate!(Term:
    Term => |v| v,
    &Term => |v| v.clone(),
    TermRef<'_> => |v| v.into_owned(),
    NamedNode => |v| v.into(),
    &NamedNode => |v| v.clone().into(),
    NamedNodeRef<'_> => |v| v.into_owned().into(),
    NamedOrBlankNode => |v| v.into(),
    &NamedOrBlankNode => |v| v.clone().into(),
);

impl<T, X: IntoCandidates<T>, const N: usize> IntoCandidates<T> for [X; N] {
    fn into_candidates(self) -> Vec<T> {
        self.into_iter().flat_map(IntoCandidates::into_candidates).collect()
    }
}

impl<T, X: IntoCandidates<T>> IntoCandidates<T> for Vec<X> {
    fn into_candidates(self) -> Vec<T> {
        self.into_iter().flat_map(IntoCandidates::into_candidates).collect()
    }
}

impl<T, X: IntoCandidates<T> + Clone> IntoCandidates<T> for &[X] {
    fn into_candidates(self) -> Vec<T> {
        self.iter()
            .cloned()
            .flat_map(IntoCandidates::into_candidates)
            .collect()
    }
}

/// Every `(a, b)` combination, `a` varying slowest.
pub fn cartesian<'a, A, B>(a: &'a [A], b: &'a [B]) -> impl Iterator<Item = (&'a A, &'a B)> + 'a {
    a.iter().flat_map(move |left| b.iter().map(move |right| (left, right)))
}
