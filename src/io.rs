//! Text and binary graph/template I/O (`spec.md` §6): the host-graph and
//! template text format share one shape (vertex count line, edge count
//! line, then that many `u v` pairs), plus a little-endian binary graph
//! format for faster repeat loads of the same host graph.
//!
//! Grounded on `original_source/EdgeList.hpp` (line-oriented text reading)
//! and `original_source/CSCGraph.hpp::serialize`/`deserialize` (the binary
//! layout, adapted to `byteorder` instead of raw pointer casts).

use crate::error::CountError;
use crate::graph::CscGraph;
use crate::template::Template;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// binary format version tag; bumped if the on-disk layout changes so an
/// old cache file is rejected instead of silently misread.
const BINARY_FORMAT_VERSION: u8 = 1;

fn parse_header(first_line: &str, second_line: &str) -> Result<(usize, usize), CountError> {
    let vertex_num: usize = first_line
        .trim()
        .parse()
        .map_err(|_| CountError::MalformedInput(format!("expected vertex count, got {first_line:?}")))?;
    let edge_num: usize = second_line
        .trim()
        .parse()
        .map_err(|_| CountError::MalformedInput(format!("expected edge count, got {second_line:?}")))?;
    Ok((vertex_num, edge_num))
}

fn parse_edge_line(line: &str) -> Result<(u64, u64), CountError> {
    let mut it = line.split_whitespace();
    let u = it
        .next()
        .ok_or_else(|| CountError::MalformedInput(format!("empty edge line {line:?}")))?;
    let v = it
        .next()
        .ok_or_else(|| CountError::MalformedInput(format!("edge line {line:?} has only one endpoint")))?;
    let u: u64 = u.parse().map_err(|_| CountError::MalformedInput(format!("bad endpoint {u:?}")))?;
    let v: u64 = v.parse().map_err(|_| CountError::MalformedInput(format!("bad endpoint {v:?}")))?;
    Ok((u, v))
}

/// Read a host graph: line 1 is `n`, line 2 is `m`, followed by `m` lines
/// of `u v`. Endpoint ids need not be contiguous or start at `0` — they
/// are compacted into `[0, distinct_count)` in order of first appearance,
/// matching `original_source/EdgeList.hpp`'s tolerance for arbitrary
/// external ids. Any vertex id never mentioned by an edge still counts
/// towards `n` as an isolated, degree-zero vertex.
pub fn read_host_graph(path: impl AsRef<Path>) -> Result<CscGraph, CountError> {
    let file = std::fs::File::open(path)?;
    let mut lines = BufReader::new(file).lines();
    let first = lines.next().ok_or_else(|| CountError::MalformedInput("empty graph file".to_string()))??;
    let second = lines
        .next()
        .ok_or_else(|| CountError::MalformedInput("graph file missing edge count line".to_string()))??;
    let (vertex_num, edge_num) = parse_header(&first, &second)?;

    let mut remap: HashMap<u64, u32> = HashMap::with_capacity(vertex_num);
    let mut src = Vec::with_capacity(edge_num);
    let mut dst = Vec::with_capacity(edge_num);
    let mut next_id = |remap: &mut HashMap<u64, u32>, raw: u64| -> u32 {
        let len = remap.len() as u32;
        *remap.entry(raw).or_insert(len)
    };

    for (count, line) in lines.enumerate() {
        if count >= edge_num {
            break;
        }
        let line = line?;
        let (u, v) = parse_edge_line(&line)?;
        src.push(next_id(&mut remap, u));
        dst.push(next_id(&mut remap, v));
    }
    if src.len() != edge_num {
        return Err(CountError::MalformedInput(format!(
            "graph file declared {edge_num} edges but only {} were present",
            src.len()
        )));
    }
    if remap.len() > vertex_num {
        return Err(CountError::MalformedInput(format!(
            "graph file declared {vertex_num} vertices but {} distinct ids appeared",
            remap.len()
        )));
    }

    CscGraph::from_edge_list(vertex_num, &src, &dst)
}

/// Read a template: same text shape as [`read_host_graph`], but endpoint
/// ids are expected to already be a dense `[0, n)` labeling (templates are
/// small and hand- or tool-authored), and the edge set is validated to be
/// a tree by [`Template::from_edges`].
pub fn read_template(path: impl AsRef<Path>) -> Result<Template, CountError> {
    let file = std::fs::File::open(path)?;
    let mut lines = BufReader::new(file).lines();
    let first = lines.next().ok_or_else(|| CountError::MalformedInput("empty template file".to_string()))??;
    let second = lines
        .next()
        .ok_or_else(|| CountError::MalformedInput("template file missing edge count line".to_string()))??;
    let (vertex_num, edge_num) = parse_header(&first, &second)?;

    let mut edges = Vec::with_capacity(edge_num);
    for (count, line) in lines.enumerate() {
        if count >= edge_num {
            break;
        }
        let line = line?;
        let (u, v) = parse_edge_line(&line)?;
        edges.push((u as usize, v as usize));
    }
    if edges.len() != edge_num {
        return Err(CountError::MalformedInput(format!(
            "template file declared {edge_num} edges but only {} were present",
            edges.len()
        )));
    }

    Template::from_edges(vertex_num, &edges)
}

/// Write the binary cache format: a leading version byte (`spec.md` §6
/// notes the original has no header/version tag and "an implementation
/// SHOULD add one"), followed by the documented fixed-width record layout
/// `num_edges:i32, num_vertices:i32, deg_list: i32[n], col_ptr: i32[n+1],
/// row_idx: i32[nnz], vals: f32[nnz]`, all little-endian.
pub fn write_binary_graph(graph: &CscGraph, path: impl AsRef<Path>) -> Result<(), CountError> {
    let num_edges = to_i32(graph.num_edges(), "num_edges")?;
    let vertex_num = to_i32(graph.vertex_num(), "vertex_num")?;
    to_i32(graph.nnz(), "nnz")?; // validated up front; col_ptr's own entries carry it on disk

    let file = std::fs::File::create(path)?;
    let mut w = BufWriter::new(file);
    w.write_u8(BINARY_FORMAT_VERSION)?;
    w.write_i32::<LittleEndian>(num_edges)?;
    w.write_i32::<LittleEndian>(vertex_num)?;
    for &d in graph.deg_list() {
        w.write_i32::<LittleEndian>(to_i32(d as usize, "deg_list entry")?)?;
    }
    for &c in graph.col_ptr() {
        w.write_i32::<LittleEndian>(to_i32(c as usize, "col_ptr entry")?)?;
    }
    for &r in graph.row_idx() {
        w.write_i32::<LittleEndian>(to_i32(r as usize, "row_idx entry")?)?;
    }
    for &v in graph.vals() {
        w.write_f32::<LittleEndian>(v)?;
    }
    w.flush()?;
    Ok(())
}

pub fn read_binary_graph(path: impl AsRef<Path>) -> Result<CscGraph, CountError> {
    let file = std::fs::File::open(path)?;
    let mut r = BufReader::new(file);

    let version = r.read_u8()?;
    if version != BINARY_FORMAT_VERSION {
        return Err(CountError::MalformedInput(format!(
            "binary graph file has format version {version}, expected {BINARY_FORMAT_VERSION}"
        )));
    }
    let num_edges = r.read_i32::<LittleEndian>()?;
    if num_edges < 0 {
        return Err(CountError::MalformedInput("binary graph file has a negative num_edges".to_string()));
    }
    let vertex_num = r.read_i32::<LittleEndian>()?;
    if vertex_num < 0 {
        return Err(CountError::MalformedInput("binary graph file has a negative num_vertices".to_string()));
    }
    let vertex_num = vertex_num as usize;

    let mut deg_list = vec![0i32; vertex_num];
    for d in deg_list.iter_mut() {
        *d = r.read_i32::<LittleEndian>()?;
    }

    let mut col_ptr = vec![0i32; vertex_num + 1];
    for c in col_ptr.iter_mut() {
        *c = r.read_i32::<LittleEndian>()?;
    }
    let nnz = *col_ptr.last().unwrap();
    if nnz < 0 {
        return Err(CountError::MalformedInput("binary graph file's col_ptr ends negative".to_string()));
    }
    let nnz = nnz as usize;

    let mut row_idx = vec![0i32; nnz];
    for row in row_idx.iter_mut() {
        *row = r.read_i32::<LittleEndian>()?;
    }

    // `vals` is read back but not threaded further: `CscGraph::from_edge_list`
    // always reconstructs multiplicity-one values, and revalidating via the
    // edge-list builder (below) catches a corrupt file instead of trusting
    // `deg_list`/`col_ptr`/`row_idx` blindly.
    let mut vals = vec![0.0f32; nnz];
    for v in vals.iter_mut() {
        *v = r.read_f32::<LittleEndian>()?;
    }
    if vals.iter().any(|&v| v != 1.0) {
        return Err(CountError::MalformedInput(
            "binary graph file has a non-1.0 edge weight; only simple graphs are supported".to_string(),
        ));
    }

    let mut src = Vec::with_capacity(nnz);
    let mut dst = Vec::with_capacity(nnz);
    for c in 0..vertex_num {
        let start = col_ptr[c] as usize;
        let end = col_ptr[c + 1] as usize;
        for &row in &row_idx[start..end] {
            let row: u32 = row
                .try_into()
                .map_err(|_| CountError::MalformedInput("binary graph file has a negative row index".to_string()))?;
            if row as usize >= c {
                src.push(row);
                dst.push(c as u32);
            }
        }
    }
    let graph = CscGraph::from_edge_list(vertex_num, &src, &dst)?;
    if graph.num_edges() != num_edges as usize {
        return Err(CountError::MalformedInput(format!(
            "binary graph file declared {num_edges} edges but col_ptr/row_idx encode {}",
            graph.num_edges()
        )));
    }
    if deg_list.iter().zip(graph.deg_list()).any(|(&stored, &actual)| stored != actual as i32) {
        return Err(CountError::MalformedInput("binary graph file's deg_list disagrees with col_ptr/row_idx".to_string()));
    }
    Ok(graph)
}

fn to_i32(value: usize, field: &str) -> Result<i32, CountError> {
    value
        .try_into()
        .map_err(|_| CountError::MalformedInput(format!("{field} value {value} does not fit in the binary format's i32 field")))
}

/// peek the first byte of a path to tell a binary cache from a text file.
/// The CLI itself takes an explicit `load_binary` flag rather than
/// sniffing (`spec.md` §6 names it as a positional argument), but this
/// stays available for callers that reuse one path across both formats
/// and want to detect which one is on disk before choosing a flag value.
pub fn looks_like_binary(path: impl AsRef<Path>) -> std::io::Result<bool> {
    let mut file = std::fs::File::open(path)?;
    let mut buf = [0u8; 1];
    if file.read(&mut buf)? == 0 {
        return Ok(false);
    }
    Ok(buf[0] == BINARY_FORMAT_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_tmp(contents: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("colorcount-io-test-{}-{}", std::process::id(), contents.len()));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_a_simple_triangle() {
        let path = write_tmp("3\n3\n0 1\n1 2\n0 2\n");
        let g = read_host_graph(&path).unwrap();
        assert_eq!(g.vertex_num(), 3);
        assert_eq!(g.num_edges(), 3);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn compacts_non_contiguous_ids() {
        let path = write_tmp("3\n2\n100 200\n200 300\n");
        let g = read_host_graph(&path).unwrap();
        assert_eq!(g.vertex_num(), 3);
        assert_eq!(g.num_edges(), 2);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn reads_a_path_template() {
        let path = write_tmp("4\n3\n0 1\n1 2\n2 3\n");
        let t = read_template(&path).unwrap();
        assert_eq!(t.vertex_num(), 4);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn rejects_a_template_with_a_cycle() {
        let path = write_tmp("3\n3\n0 1\n1 2\n0 2\n");
        let err = read_template(&path).unwrap_err();
        assert!(matches!(err, CountError::MalformedInput(_)));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn binary_round_trip_preserves_adjacency() {
        let g = CscGraph::from_edge_list(4, &[0, 1, 2], &[1, 2, 3]).unwrap();
        let mut path = std::env::temp_dir();
        path.push(format!("colorcount-io-test-bin-{}", std::process::id()));
        write_binary_graph(&g, &path).unwrap();
        assert!(looks_like_binary(&path).unwrap());
        let g2 = read_binary_graph(&path).unwrap();
        assert_eq!(g2.vertex_num(), g.vertex_num());
        assert_eq!(g2.nnz(), g.nnz());
        assert_eq!(g2.row_idx(), g.row_idx());
        assert_eq!(g2.num_edges(), g.num_edges());
        assert_eq!(g2.deg_list(), g.deg_list());
        assert_eq!(g2.vals(), g.vals());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn binary_file_contains_every_documented_field() {
        // spec.md §6: num_edges:i32, num_vertices:i32, deg_list: i32[n],
        // col_ptr: i32[n+1], row_idx: i32[nnz], vals: f32[nnz], after a
        // one-byte version tag this crate prepends.
        let g = CscGraph::from_edge_list(4, &[0, 1, 2], &[1, 2, 3]).unwrap();
        let mut path = std::env::temp_dir();
        path.push(format!("colorcount-io-test-bin-fields-{}", std::process::id()));
        write_binary_graph(&g, &path).unwrap();
        let expected_bytes = 1 // version
            + 4 // num_edges
            + 4 // num_vertices
            + g.deg_list().len() * 4
            + g.col_ptr().len() * 4
            + g.row_idx().len() * 4
            + g.vals().len() * 4;
        let actual_bytes = std::fs::metadata(&path).unwrap().len() as usize;
        assert_eq!(actual_bytes, expected_bytes);
        std::fs::remove_file(path).ok();
    }
}
