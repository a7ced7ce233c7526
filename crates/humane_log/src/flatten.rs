//! Flattening of nested attribute groups into dotted keys.

use std::borrow::Cow;

use crate::{
    Attr, ReplaceAttr, Value,
    encode::{self, TimeLayout},
};

/// The chain of group names enclosing an attribute.
///
/// Each nested group borrows its parent from the stack frame that opened it, so a path is never
/// mutated once built and extending it costs no allocation.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct GroupPath<'a> {
    head: Option<&'a Segment<'a>>,
}

#[derive(Debug)]
struct Segment<'a> {
    name: &'a str,
    parent: GroupPath<'a>,
}

impl<'a> GroupPath<'a> {
    /// The top-level path, outside any group.
    pub(crate) fn root() -> Self {
        Self::default()
    }

    /// Runs `f` with `name` appended to this path.
    pub(crate) fn nest<R>(self, name: &'a str, f: impl FnOnce(GroupPath<'_>) -> R) -> R {
        let segment = Segment { name, parent: self };
        f(GroupPath {
            head: Some(&segment),
        })
    }

    /// Group names from the outermost to the innermost.
    pub(crate) fn segments(self) -> Vec<&'a str> {
        let mut segments = Vec::new();
        let mut cursor = self.head;
        while let Some(segment) = cursor {
            segments.push(segment.name);
            cursor = segment.parent.head;
        }
        segments.reverse();
        segments
    }

    /// The dotted key of `key` within this path.
    pub(crate) fn qualify<'k>(self, key: &'k str) -> Cow<'k, str> {
        if self.head.is_none() {
            return Cow::Borrowed(key);
        }
        let mut qualified = self.segments().join(".");
        qualified.push('.');
        qualified.push_str(key);
        Cow::Owned(qualified)
    }
}

/// Walks attribute trees, emitting one `(dotted key, encoded value)` pair per surviving leaf.
pub(crate) struct Flattener<'h> {
    layout: &'h TimeLayout,
    replace_attr: Option<&'h ReplaceAttr>,
}

impl<'h> Flattener<'h> {
    pub(crate) fn new(layout: &'h TimeLayout, replace_attr: Option<&'h ReplaceAttr>) -> Self {
        Self {
            layout,
            replace_attr,
        }
    }

    /// Flattens `attrs` in order under `path`.
    pub(crate) fn flatten(
        &self,
        path: GroupPath<'_>,
        attrs: &[Attr],
        emit: &mut dyn FnMut(&str, &str),
    ) {
        for attr in attrs {
            self.attr(path, attr, emit);
        }
    }

    fn attr(&self, path: GroupPath<'_>, attr: &Attr, emit: &mut dyn FnMut(&str, &str)) {
        let value = match &attr.value {
            Value::Deferred(_) => Cow::Owned(attr.value.clone().resolve()),
            value => Cow::Borrowed(value),
        };

        if let Value::Group(children) = value.as_ref() {
            if children.is_empty() {
                return;
            }
            if attr.key.is_empty() {
                self.flatten(path, children, emit);
            } else {
                path.nest(&attr.key, |path| self.flatten(path, children, emit));
            }
            return;
        }

        self.leaf(path, &attr.key, value, emit);
    }

    fn leaf(
        &self,
        path: GroupPath<'_>,
        key: &str,
        value: Cow<'_, Value>,
        emit: &mut dyn FnMut(&str, &str),
    ) {
        let rewritten;
        let (key, value) = match self.replace_attr {
            Some(replace_attr) => {
                let attr = Attr {
                    key: key.to_owned(),
                    value: value.into_owned(),
                };
                let groups = path.segments();
                rewritten = replace_attr(groups.as_slice(), attr);
                (rewritten.key.as_str(), &rewritten.value)
            }
            None => (key, value.as_ref()),
        };

        // Covers the empty-attribute sentinel.
        if key.is_empty() {
            return;
        }

        if let Some(encoded) = encode::value(value, self.layout) {
            emit(&path.qualify(key), &encoded);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    fn collect(flattener: &Flattener<'_>, attrs: &[Attr]) -> Vec<String> {
        let mut pairs = Vec::new();
        flattener.flatten(GroupPath::root(), attrs, &mut |key: &str, value: &str| {
            pairs.push(format!("{key}={value}"));
        });
        pairs
    }

    #[test]
    fn nested_groups_compose_dotted_keys() {
        let layout = TimeLayout::new("");
        let flattener = Flattener::new(&layout, None);
        let attrs = [
            Attr::group(
                "foo",
                [Attr::int("c", 3), Attr::group("bar", [Attr::int("d", 4)])],
            ),
            Attr::int("c", 3),
        ];

        assert_eq!(collect(&flattener, &attrs), ["foo.c=3", "foo.bar.d=4", "c=3"]);
    }

    #[test]
    fn empty_groups_vanish_and_unnamed_groups_inline() {
        let layout = TimeLayout::new("");
        let flattener = Flattener::new(&layout, None);
        let attrs = [
            Attr::group("empty", []),
            Attr::group("", []),
            Attr::group("", [Attr::string("inlined", "yes")]),
            Attr::string("", "dropped"),
        ];

        assert_eq!(collect(&flattener, &attrs), ["inlined=yes"]);
    }

    #[test]
    fn deferred_groups_are_flattened() {
        let layout = TimeLayout::new("");
        let flattener = Flattener::new(&layout, None);
        let attrs = [Attr::deferred("req", || {
            Value::Group(vec![Attr::string("method", "GET")])
        })];

        assert_eq!(collect(&flattener, &attrs), ["req.method=GET"]);
    }

    #[test]
    fn deferred_leaves_run_their_producer_once_per_pass() {
        let layout = TimeLayout::new("");
        let flattener = Flattener::new(&layout, None);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let attrs = [Attr::deferred("n", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Value::deferred(|| Value::Int64(7))
        })];

        assert_eq!(collect(&flattener, &attrs), ["n=Deferred(..)"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        collect(&flattener, &attrs);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn hook_sees_enclosing_groups_but_not_the_leaf_key() {
        let layout = TimeLayout::new("");
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&seen);
        let hook: ReplaceAttr = Arc::new(move |groups: &[&str], attr: Attr| {
            recorder
                .lock()
                .expect("recorder lock")
                .push(format!("{}:{}", groups.join("/"), attr.key));
            if attr.key == "secret" {
                Attr::empty()
            } else {
                attr
            }
        });
        let flattener = Flattener::new(&layout, Some(&hook));
        let attrs = [Attr::group(
            "a",
            [
                Attr::group("b", [Attr::int("x", 1)]),
                Attr::string("secret", "hunter2"),
            ],
        )];

        assert_eq!(collect(&flattener, &attrs), ["a.b.x=1"]);
        assert_eq!(*seen.lock().expect("recorder lock"), ["a/b:x", "a:secret"]);
    }

    #[test]
    fn quoted_values_are_emitted_encoded() {
        let layout = TimeLayout::new("");
        let flattener = Flattener::new(&layout, None);
        let attrs = [Attr::string("foo", "bar bar")];

        assert_eq!(collect(&flattener, &attrs), [r#"foo="bar bar""#]);
    }
}
