//! The persistent history of `with_group` / `with_attrs` calls behind a derived handler.

use std::sync::Arc;

use crate::{
    Attr,
    flatten::{Flattener, GroupPath},
};

/// One step in a handler's derivation history.
#[derive(Clone, Debug)]
pub enum Frame {
    /// A group opened by [`Handler::with_group`][crate::Handler::with_group]. It qualifies
    /// every attribute recorded after it.
    GroupPush(String),

    /// Attributes recorded by [`Handler::with_attrs`][crate::Handler::with_attrs].
    AttrBatch(Vec<Attr>),
}

/// An immutable, parent-linked list of frames, newest first.
///
/// Nodes are never modified after creation, so handlers derived from the same parent share
/// every frame they have in common.
#[derive(Clone, Debug, Default)]
pub(crate) struct Chain {
    head: Option<Arc<Link>>,
}

#[derive(Debug)]
struct Link {
    frame: Frame,
    parent: Chain,
}

impl Chain {
    /// A new chain with `frame` on top of this one.
    pub(crate) fn push(&self, frame: Frame) -> Self {
        Self {
            head: Some(Arc::new(Link {
                frame,
                parent: self.clone(),
            })),
        }
    }

    /// Frames in the order they were recorded.
    pub(crate) fn frames(&self) -> Vec<&Frame> {
        let mut frames = Vec::new();
        let mut cursor = self.head.as_deref();
        while let Some(link) = cursor {
            frames.push(&link.frame);
            cursor = link.parent.head.as_deref();
        }
        frames.reverse();
        frames
    }

    /// Flattens every recorded batch, then `tail`, through `flattener`.
    ///
    /// Groups apply from the point they were opened onwards: each one qualifies the batches
    /// recorded after it and all of `tail`.
    pub(crate) fn replay(
        &self,
        flattener: &Flattener<'_>,
        tail: &[Attr],
        emit: &mut dyn FnMut(&str, &str),
    ) {
        replay_frames(&self.frames(), GroupPath::root(), flattener, tail, emit);
    }
}

fn replay_frames(
    frames: &[&Frame],
    path: GroupPath<'_>,
    flattener: &Flattener<'_>,
    tail: &[Attr],
    emit: &mut dyn FnMut(&str, &str),
) {
    let mut remaining = frames;
    while let Some((frame, rest)) = remaining.split_first() {
        match frame {
            Frame::AttrBatch(attrs) => flattener.flatten(path, attrs, emit),
            Frame::GroupPush(name) => {
                return path.nest(name, |path| {
                    replay_frames(rest, path, flattener, tail, emit);
                });
            }
        }
        remaining = rest;
    }
    flattener.flatten(path, tail, emit);
}
