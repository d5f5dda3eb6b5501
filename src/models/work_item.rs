use std::path::{Path, PathBuf};

/// 一个待处理的输入文件（一个样本）
///
/// 创建后不可变，输出路径在创建时确定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    artifact: PathBuf,
    base_name: String,
    primary_output: PathBuf,
    model_output: PathBuf,
}

impl WorkItem {
    /// 根据输入文件和输出目录创建
    ///
    /// `{output_dir}/{base}.txt` 和 `{output_dir}/{base}{model_suffix}.txt`
    pub fn new(artifact: impl Into<PathBuf>, output_dir: &Path, model_suffix: &str) -> Self {
        let artifact = artifact.into();
        let base_name = artifact
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let primary_output = output_dir.join(format!("{}.txt", base_name));
        let model_output = output_dir.join(format!("{}{}.txt", base_name, model_suffix));

        Self {
            artifact,
            base_name,
            primary_output,
            model_output,
        }
    }

    pub fn artifact(&self) -> &Path {
        &self.artifact
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn primary_output(&self) -> &Path {
        &self.primary_output
    }

    pub fn model_output(&self) -> &Path {
        &self.model_output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_paths() {
        let item = WorkItem::new("/in/pipe_0001.vtser", Path::new("/out"), "_model");
        assert_eq!(item.base_name(), "pipe_0001");
        assert_eq!(item.primary_output(), Path::new("/out/pipe_0001.txt"));
        assert_eq!(item.model_output(), Path::new("/out/pipe_0001_model.txt"));
    }

    #[test]
    fn test_base_name_keeps_inner_dots() {
        let item = WorkItem::new("/in/D1.5_L20.VTSER", Path::new("out"), "_model");
        assert_eq!(item.base_name(), "D1.5_L20");
        assert_eq!(item.primary_output(), Path::new("out/D1.5_L20.txt"));
    }
}
