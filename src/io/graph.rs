use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::{
    classify::{Class, Classification},
    error::{Error, Result},
    misc::log::targets,
    process::Edges,
    types::Var,
};

/// Label lines (`<var> "<token>" ...`) of every named, non-auxiliary
/// variable, split by class.
#[derive(Debug, Default)]
pub struct Labels {
    pub vertices: Vec<String>,
    pub core: Vec<String>,
    pub dead: Vec<String>,
}

impl Labels {
    pub fn new(names: &[Option<Vec<String>>], classification: &Classification) -> Self {
        let mut labels = Labels::default();

        let vars = classification.var_count() + 1;
        for (var, tokens) in names.iter().enumerate().take(vars).skip(1) {
            let Some(tokens) = tokens else { continue };
            if classification.is_aux(var) {
                continue;
            }

            let line = label_line(var, tokens);
            match classification.class(var) {
                Class::Core => labels.core.push(line.clone()),
                Class::Dead => labels.dead.push(line.clone()),
                Class::Free => (),
            }
            labels.vertices.push(line);
        }

        labels
    }
}

fn label_line(var: Var, tokens: &[String]) -> String {
    tokens
        .iter()
        .fold(var.to_string(), |line, token| line + " \"" + token + "\"")
}

#[derive(Clone, Copy)]
pub enum Section {
    /// Directed, for requires edges.
    Arcs,
    /// Undirected, for excludes edges.
    Edges,
}

/// Writes a Pajek `.net` graph.
pub fn write_graph(
    writer: &mut impl Write,
    vertex_count: usize,
    labels: &[String],
    section: Section,
    edges: &[(Var, Var)],
) -> std::io::Result<()> {
    let mut writer = BufWriter::new(writer);

    writeln!(writer, "*Vertices {vertex_count}")?;
    for line in labels {
        writeln!(writer, "{line}")?;
    }

    let marker = match section {
        Section::Arcs => "*Arcs",
        Section::Edges => "*Edges",
    };
    writeln!(writer, "{marker}")?;
    for (source, target) in edges {
        writeln!(writer, "{source} {target}")?;
    }
    writeln!(writer)?;

    writer.flush()
}

pub fn write_features(writer: &mut impl Write, labels: &[String]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(writer);
    for line in labels {
        writeln!(writer, "{line}")?;
    }
    writer.flush()
}

/// The four artifacts of a run, named after the input's stem.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputPaths {
    pub requires: PathBuf,
    pub excludes: PathBuf,
    pub core: PathBuf,
    pub dead: PathBuf,
}

impl OutputPaths {
    pub fn new(dir: &Path, basename: &str) -> Self {
        let path = |suffix: &str| dir.join(format!("{basename}__{suffix}"));
        Self {
            requires: path("requires.net"),
            excludes: path("excludes.net"),
            core: path("core.txt"),
            dead: path("dead.txt"),
        }
    }

    /// Creates the output directory if needed and writes every artifact.
    pub fn write(&self, vertex_count: usize, labels: &Labels, edges: &Edges) -> Result<()> {
        if let Some(dir) = self.requires.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir).map_err(|source| Error::Io {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }
        }

        write_file(&self.core, |file| write_features(file, &labels.core))?;
        write_file(&self.dead, |file| write_features(file, &labels.dead))?;
        write_file(&self.requires, |file| {
            write_graph(file, vertex_count, &labels.vertices, Section::Arcs, &edges.requires)
        })?;
        write_file(&self.excludes, |file| {
            write_graph(file, vertex_count, &labels.vertices, Section::Edges, &edges.excludes)
        })?;

        Ok(())
    }
}

fn write_file(
    path: &Path,
    write: impl FnOnce(&mut File) -> std::io::Result<()>,
) -> Result<()> {
    log::info!(target: targets::OUTPUT, "Saving to {}", path.display());
    File::create(path)
        .and_then(|mut file| write(&mut file))
        .map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
}
