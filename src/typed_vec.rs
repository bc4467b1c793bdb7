// Arenas of plain records addressed by typed indices.
//
// The engine's linked structures (edge rings, output-point rings, tree nodes)
// all live in one of these, with "pointers" stored as indices. Nothing is
// ever removed from an arena during an operation, so an index handed out
// stays valid until the arena is cleared.
//
// The index type is declared by the caller (it decides the visibility of the
// wrapped `usize`); the macro declares the arena itself.
macro_rules! impl_typed_vec {
    ($(#[$meta:meta])* $vis:vis struct $arena:ident<T>[$idx:ident], $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone)]
        $vis struct $arena<T> {
            records: Vec<T>,
        }

        impl std::fmt::Debug for $idx {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, "_{}"), self.0)
            }
        }

        #[allow(dead_code)]
        impl<T> $arena<T> {
            /// The index the next `push` will return.
            pub fn next_index(&self) -> $idx {
                $idx(self.records.len())
            }

            /// Appends a record, returning its index.
            pub fn push(&mut self, record: T) -> $idx {
                let idx = self.next_index();
                self.records.push(record);
                idx
            }

            pub fn len(&self) -> usize {
                self.records.len()
            }

            pub fn is_empty(&self) -> bool {
                self.records.is_empty()
            }

            /// Drops every record. Indices handed out before this are invalid afterwards.
            pub fn clear(&mut self) {
                self.records.clear();
            }

            /// All indices currently handed out, in insertion order.
            pub fn indices(&self) -> impl Iterator<Item = $idx> {
                (0..self.records.len()).map($idx)
            }

            pub fn iter(&self) -> impl Iterator<Item = ($idx, &T)> + '_ {
                self.indices().zip(&self.records)
            }
        }

        impl<T> Default for $arena<T> {
            fn default() -> Self {
                Self {
                    records: Vec::new(),
                }
            }
        }

        impl<T> std::ops::Index<$idx> for $arena<T> {
            type Output = T;

            fn index(&self, idx: $idx) -> &T {
                &self.records[idx.0]
            }
        }

        impl<T> std::ops::IndexMut<$idx> for $arena<T> {
            fn index_mut(&mut self, idx: $idx) -> &mut T {
                &mut self.records[idx.0]
            }
        }

        impl<T: std::fmt::Debug> std::fmt::Debug for $arena<T> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_map().entries(self.iter()).finish()
            }
        }
    };
}
