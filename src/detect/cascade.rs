//! Boosted Haar cascade model and its loader for OpenCV's
//! `opencv-cascade-classifier` XML storage format (the layout of
//! `haarcascade_frontalface_default.xml`).
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::Event;
use thiserror::Error;
use tracing::info;

/// Errors encountered when loading a cascade file
#[derive(Debug, Error)]
pub enum CascadeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("Missing field `{0}` in cascade")]
    MissingField(&'static str),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Unsupported cascade: {0}")]
    Unsupported(String),
}

/// Rectangle of a Haar feature, relative to the detection window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub weight: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HaarFeature {
    pub rects: Vec<WeightedRect>,
}

/// Decision tree node; a child index `<= 0` points at leaf `-index`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeNode {
    pub left: i32,
    pub right: i32,
    pub feature: usize,
    pub threshold: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeakClassifier {
    pub nodes: Vec<TreeNode>,
    pub leaves: Vec<f32>,
}

impl WeakClassifier {
    /// Walk the tree with `feature_value(feature_index)` and return the leaf.
    pub fn evaluate(&self, mut feature_value: impl FnMut(usize) -> f32) -> f32 {
        let mut idx = 0i32;
        loop {
            let node = &self.nodes[idx as usize];
            idx = if feature_value(node.feature) < node.threshold {
                node.left
            } else {
                node.right
            };
            if idx <= 0 {
                return self.leaves[(-idx) as usize];
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stage {
    pub threshold: f32,
    pub classifiers: Vec<WeakClassifier>,
}

/// A loaded cascade: window size, rejection stages and the feature pool.
#[derive(Debug, Clone, PartialEq)]
pub struct HaarCascade {
    pub window_width: u32,
    pub window_height: u32,
    pub stages: Vec<Stage>,
    pub features: Vec<HaarFeature>,
}

impl HaarCascade {
    pub fn from_file(path: &Path) -> Result<Self, CascadeError> {
        let text = std::fs::read_to_string(path)?;
        let cascade = Self::from_xml(&text)?;
        info!(
            "Loaded Haar cascade {:?}: {}x{} window, {} stages, {} features",
            path,
            cascade.window_width,
            cascade.window_height,
            cascade.stages.len(),
            cascade.features.len()
        );
        Ok(cascade)
    }

    pub fn from_xml(xml: &str) -> Result<Self, CascadeError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut path: Vec<String> = Vec::new();
        let mut saw_cascade = false;
        let mut window_width: Option<u32> = None;
        let mut window_height: Option<u32> = None;
        let mut stages: Vec<Stage> = Vec::new();
        let mut features: Vec<HaarFeature> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(ref e) => {
                    let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    path.push(tag);
                    let tail = path_tail(&path);
                    match tail.as_slice() {
                        [.., "opencv_storage", "cascade"] => saw_cascade = true,
                        [.., "cascade", "stages", "_"] => stages.push(Stage::default()),
                        [.., "weakClassifiers", "_"] => stages
                            .last_mut()
                            .ok_or(CascadeError::MissingField("stages"))?
                            .classifiers
                            .push(WeakClassifier::default()),
                        [.., "cascade", "features", "_"] => features.push(HaarFeature::default()),
                        _ => {}
                    }
                }
                Event::End(_) => {
                    path.pop();
                }
                Event::Text(e) => {
                    let txt = e.unescape()?;
                    let txt = txt.trim();
                    let tail = path_tail(&path);
                    match tail.as_slice() {
                        [.., "cascade", "featureType"] if !txt.eq_ignore_ascii_case("HAAR") => {
                            return Err(CascadeError::Unsupported(format!(
                                "feature type {txt}"
                            )));
                        }
                        [.., "cascade", "stageType"] if !txt.eq_ignore_ascii_case("BOOST") => {
                            return Err(CascadeError::Unsupported(format!("stage type {txt}")));
                        }
                        [.., "cascade", "width"] => window_width = Some(parse_num(txt, "width")?),
                        [.., "cascade", "height"] => {
                            window_height = Some(parse_num(txt, "height")?)
                        }
                        [.., "stages", "_", "stageThreshold"] => {
                            if let Some(stage) = stages.last_mut() {
                                stage.threshold = parse_num(txt, "stageThreshold")?;
                            }
                        }
                        [.., "weakClassifiers", "_", "internalNodes"] => {
                            let weak = current_weak(&mut stages)?;
                            weak.nodes = parse_nodes(txt)?;
                        }
                        [.., "weakClassifiers", "_", "leafValues"] => {
                            let weak = current_weak(&mut stages)?;
                            weak.leaves = parse_list(txt, "leafValues")?;
                        }
                        [.., "features", "_", "rects", "_"] => {
                            let rect = parse_rect(txt)?;
                            features
                                .last_mut()
                                .ok_or(CascadeError::MissingField("features"))?
                                .rects
                                .push(rect);
                        }
                        [.., "features", "_", "tilted"] if txt != "0" => {
                            return Err(CascadeError::Unsupported(
                                "tilted Haar features".to_string(),
                            ));
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !saw_cascade {
            return Err(CascadeError::Unsupported(
                "not an opencv-cascade-classifier storage file".to_string(),
            ));
        }

        let cascade = HaarCascade {
            window_width: window_width.ok_or(CascadeError::MissingField("width"))?,
            window_height: window_height.ok_or(CascadeError::MissingField("height"))?,
            stages,
            features,
        };
        cascade.validate()?;
        Ok(cascade)
    }

    /// Cross-check indices and rectangles so evaluation can index freely.
    fn validate(&self) -> Result<(), CascadeError> {
        if self.window_width < 3 || self.window_height < 3 {
            return Err(CascadeError::Parse(format!(
                "window {}x{} is too small",
                self.window_width, self.window_height
            )));
        }
        if self.stages.is_empty() {
            return Err(CascadeError::MissingField("stages"));
        }
        for (si, stage) in self.stages.iter().enumerate() {
            for weak in &stage.classifiers {
                if weak.nodes.is_empty() {
                    return Err(CascadeError::Parse(format!(
                        "stage {si}: weak classifier without nodes"
                    )));
                }
                for (ni, node) in weak.nodes.iter().enumerate() {
                    if node.feature >= self.features.len() {
                        return Err(CascadeError::Parse(format!(
                            "stage {si}: feature index {} out of range",
                            node.feature
                        )));
                    }
                    // Children must lie further down the node list so the walk terminates.
                    for child in [node.left, node.right] {
                        let ok = if child > 0 {
                            (child as usize) > ni && (child as usize) < weak.nodes.len()
                        } else {
                            (child.unsigned_abs() as usize) < weak.leaves.len()
                        };
                        if !ok {
                            return Err(CascadeError::Parse(format!(
                                "stage {si}: child index {child} out of range"
                            )));
                        }
                    }
                }
            }
        }
        for (fi, feature) in self.features.iter().enumerate() {
            if feature.rects.is_empty() {
                return Err(CascadeError::Parse(format!("feature {fi} has no rects")));
            }
            for r in &feature.rects {
                let right = r.x.checked_add(r.width);
                let bottom = r.y.checked_add(r.height);
                if right.is_none_or(|v| v > self.window_width)
                    || bottom.is_none_or(|v| v > self.window_height)
                {
                    return Err(CascadeError::Parse(format!(
                        "feature {fi} leaves the {}x{} window",
                        self.window_width, self.window_height
                    )));
                }
            }
        }
        Ok(())
    }
}

fn path_tail(path: &[String]) -> Vec<&str> {
    path.iter().map(String::as_str).collect()
}

fn current_weak(stages: &mut [Stage]) -> Result<&mut WeakClassifier, CascadeError> {
    stages
        .last_mut()
        .and_then(|s| s.classifiers.last_mut())
        .ok_or(CascadeError::MissingField("weakClassifiers"))
}

fn parse_num<T: std::str::FromStr>(txt: &str, field: &str) -> Result<T, CascadeError> {
    txt.parse::<T>()
        .map_err(|_| CascadeError::Parse(format!("{field}: cannot parse {txt:?}")))
}

fn parse_list<T: std::str::FromStr>(txt: &str, field: &str) -> Result<Vec<T>, CascadeError> {
    txt.split_whitespace().map(|t| parse_num(t, field)).collect()
}

/// `internalNodes` holds `left right featureIdx threshold` per node.
fn parse_nodes(txt: &str) -> Result<Vec<TreeNode>, CascadeError> {
    let tokens: Vec<&str> = txt.split_whitespace().collect();
    if tokens.is_empty() || tokens.len() % 4 != 0 {
        return Err(CascadeError::Parse(format!(
            "internalNodes: expected groups of 4 values, got {}",
            tokens.len()
        )));
    }
    tokens
        .chunks(4)
        .map(|c| {
            Ok(TreeNode {
                left: parse_num(c[0], "internalNodes")?,
                right: parse_num(c[1], "internalNodes")?,
                feature: parse_num(c[2], "internalNodes")?,
                threshold: parse_num(c[3], "internalNodes")?,
            })
        })
        .collect()
}

/// A rect line is `x y width height weight`, weight often written as `-1.`.
fn parse_rect(txt: &str) -> Result<WeightedRect, CascadeError> {
    let tokens: Vec<&str> = txt.split_whitespace().collect();
    if tokens.len() != 5 {
        return Err(CascadeError::Parse(format!("rect: expected 5 values in {txt:?}")));
    }
    Ok(WeightedRect {
        x: parse_num(tokens[0], "rect")?,
        y: parse_num(tokens[1], "rect")?,
        width: parse_num(tokens[2], "rect")?,
        height: parse_num(tokens[3], "rect")?,
        weight: parse_num(tokens[4], "rect")?,
    })
}
