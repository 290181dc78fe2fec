//! Graphviz rendering of the arena, for debugging the collector.

use dot_writer::{Attributes, DotWriter};
use maud::PreEscaped;

use super::{Ptr, Runtime, Tag};
use crate::dispatch;

/// Bytes of rendered text shown for each object.
const LABEL_WIDTH: usize = 32;

/// One top-level object in the arena.
struct Placed {
    start: usize,
    size: usize,
    tag: Tag,
    permanent: bool,
}

fn node_for(start: usize) -> String {
    format!("obj{start}")
}

/// The top-level object containing `offset`, if any.
fn containing(objects: &[Placed], offset: usize) -> Option<&Placed> {
    let idx = objects.partition_point(|o| o.start <= offset);
    let o = objects.get(idx.checked_sub(1)?)?;
    (offset < o.start + o.size).then_some(o)
}

fn label(rt: &Runtime, start: usize) -> String {
    let object = Ptr::new(rt, start);
    let mut buffer = [0u8; LABEL_WIDTH];
    match crate::render::render(&object, &mut buffer, true) {
        Ok(n) if n <= LABEL_WIDTH => String::from_utf8_lossy(&buffer[..n]).into_owned(),
        // The renderer only writes whole characters, so trim the zero fill.
        Ok(_) => {
            let text = String::from_utf8_lossy(&buffer);
            format!("{}…", text.trim_end_matches('\0'))
        }
        Err(e) => format!("<{e}>"),
    }
}

/// Render the arena (regions, objects, stack and safe pointers) as a Graphviz digraph.
pub fn render_arena(rt: &Runtime) -> Vec<u8> {
    let (objects, stack, pointers) = {
        let arena = rt.arena.borrow();
        let mut objects = Vec::new();
        let mut at = 0;
        while at < arena.temporaries {
            let size = dispatch::size(&arena.memory[at..arena.temporaries]);
            objects.push(Placed {
                start: at,
                size,
                tag: super::objects::tag_of(&arena.memory[at..]),
                permanent: at < arena.globals,
            });
            at += size;
        }
        let stack: Vec<usize> = (0..arena.depth()).map(|level| arena.slot(level)).collect();
        let pointers: Vec<(usize, usize)> = rt.roots.borrow().live().collect();
        (objects, stack, pointers)
    };
    let stats = rt.stats();

    let mut outbuf = Vec::new();
    {
        let mut writer = DotWriter::from(&mut outbuf);
        let mut graph = writer.digraph();

        for object in objects.iter() {
            let text = label(rt, object.start);
            let mut node = graph.node_named(node_for(object.start));
            node.set_shape(dot_writer::Shape::None);
            let color = if object.permanent { "lightblue" } else { "white" };
            let marker = dispatch::marker(object.tag).map(String::from).unwrap_or_default();
            node.set_html(&format!(
                "<{}>",
                maud::html!(
                    table bgcolor=(color) {
                        tr { td border="0" { (format!("{marker}{}@{}", object.tag, object.start)) } }
                        tr { td { (text) } }
                        tr { td border="0" { (format!("{} bytes, {}", object.size, dispatch::help(object.tag))) } }
                    }
                )
                .into_string()
            ));
        }

        let summary = maud::html!(
            table {
                tr { td { "globals" } td { (stats.globals) } }
                tr { td { "temporaries" } td { (stats.temporaries) } }
                tr { td { "scratch" } td { (stats.scratch) } }
                tr { td { "free" } td { (stats.free) } }
                tr { td { "collections" } td { (stats.collections) } }
            }
        );
        graph
            .node_named("arena")
            .set_shape(dot_writer::Shape::None)
            .set_html(&format!("<{}>", summary.into_string()));

        let rows = |prefix: &str, keys: Vec<usize>| -> PreEscaped<String> {
            maud::html! {
                @for (i, k) in keys.iter().enumerate() {
                    tr { td port=(format!("{prefix}{i}")) { (format!("{prefix} {k}")) } }
                }
            }
        };
        let levels: Vec<usize> = (1..=stack.len()).collect();
        let slots: Vec<usize> = pointers.iter().map(|(slot, _)| *slot).collect();
        let stack_id = {
            let mut node = graph.node_named("stack");
            node.set_shape(dot_writer::Shape::None);
            node.set_html(&format!(
                "<{}>",
                maud::html!(table { tr { td { b { "stack" } } } (rows("level", levels)) }).into_string()
            ));
            node.id()
        };
        let pointers_id = {
            let mut node = graph.node_named("pointers");
            node.set_shape(dot_writer::Shape::None);
            node.set_html(&format!(
                "<{}>",
                maud::html!(table { tr { td { b { "safe pointers" } } } (rows("slot", slots)) }).into_string()
            ));
            node.id()
        };

        for (i, offset) in stack.iter().enumerate() {
            if let Some(target) = containing(&objects, *offset) {
                graph.edge(stack_id.port(&format!("level{i}")), node_for(target.start));
            }
        }
        for (i, (_, offset)) in pointers.iter().enumerate() {
            if let Some(target) = containing(&objects, *offset) {
                let edge = graph.edge(pointers_id.port(&format!("slot{i}")), node_for(target.start));
                if *offset != target.start {
                    edge.attributes().set_label(&format!("+{}", offset - target.start));
                }
            }
        }
    }
    outbuf
}
