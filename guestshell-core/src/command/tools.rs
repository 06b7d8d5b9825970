//! Builders for one-shot libguestfs tool invocations
//!
//! Each builder returns a [`ToolCommand`] holding the program and its argv.
//! Nothing is executed here; see [`crate::tools::run_tool`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::quote::join_command_line;
use crate::error::{ToolError, ToolResult};

/// Timeout used by `virt-sysprep`, which usually takes minutes
pub const SYSPREP_TIMEOUT_SECS: u64 = 600;

/// Timeout used by `virt-clone`
pub const CLONE_TIMEOUT_SECS: u64 = 180;

/// What a tool operates on: a disk image (`-a`) or a libvirt domain (`-d`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Disk image path
    Disk(PathBuf),
    /// libvirt domain name
    Domain(String),
}

impl Target {
    /// Treats `value` as a disk if such a file exists, otherwise as a domain name
    #[must_use]
    pub fn detect(value: &str) -> Self {
        let expanded = shellexpand::tilde(value);
        let path = Path::new(expanded.as_ref());
        if path.is_file() {
            Self::Disk(path.to_path_buf())
        } else {
            Self::Domain(value.to_string())
        }
    }

    /// The `-a`/`-d` option pair
    #[must_use]
    pub fn to_args(&self) -> [String; 2] {
        match self {
            Self::Disk(path) => ["-a".to_string(), path.to_string_lossy().into_owned()],
            Self::Domain(name) => ["-d".to_string(), name.clone()],
        }
    }

    /// The bare disk path or domain name
    #[must_use]
    pub fn value(&self) -> String {
        match self {
            Self::Disk(path) => path.to_string_lossy().into_owned(),
            Self::Domain(name) => name.clone(),
        }
    }
}

/// A ready-to-run tool invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    /// Program name, e.g. `virt-cat`
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
    /// Timeout override; the runner default applies when `None`
    pub timeout: Option<Duration>,
}

impl ToolCommand {
    /// Creates an invocation with no arguments
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: None,
        }
    }

    /// Appends an argument
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Appends `flag` when `enabled`
    #[must_use]
    pub fn flag(self, flag: &str, enabled: bool) -> Self {
        if enabled { self.arg(flag) } else { self }
    }

    /// Appends `flag value` when `value` is set
    #[must_use]
    pub fn opt(self, flag: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.arg(flag).arg(value),
            None => self,
        }
    }

    /// Appends `flag=value` when `value` is set
    #[must_use]
    pub fn opt_eq(self, flag: &str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.arg(format!("{flag}={value}")),
            None => self,
        }
    }

    /// Appends `-a disk` or `-d domain`
    #[must_use]
    pub fn target(self, target: &Target) -> Self {
        self.args(target.to_args())
    }

    /// Sets the timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Shell-safe command line for logs
    #[must_use]
    pub fn command_line(&self) -> String {
        join_command_line(&self.program, &self.args)
    }
}

/// `virt-cat (-a|-d) target path`
#[must_use]
pub fn virt_cat(target: &Target, file_path: &str) -> ToolCommand {
    ToolCommand::new("virt-cat").target(target).arg(file_path)
}

/// `virt-ls [-c uri] (-a|-d) target path [extra...]`
#[must_use]
pub fn virt_ls(target: &Target, path: &str, uri: Option<&str>, extra: &[String]) -> ToolCommand {
    ToolCommand::new("virt-ls")
        .opt("-c", uri)
        .target(target)
        .arg(path)
        .args(extra.iter().cloned())
}

/// `virt-df target`
#[must_use]
pub fn virt_df(target: &Target) -> ToolCommand {
    ToolCommand::new("virt-df").target(target)
}

/// Display selection for `virt-filesystems`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesystemsOpts {
    /// `--all`
    pub all: bool,
    /// `--filesystems`
    pub filesystems: bool,
    /// `--extra`
    pub extra: bool,
    /// `--partitions`
    pub partitions: bool,
    /// `--block-devices`
    pub block_devices: bool,
    /// `--logical-volumes`
    pub logical_volumes: bool,
    /// `--volume-groups`
    pub volume_groups: bool,
    /// `--physical-volumes`
    pub physical_volumes: bool,
    /// `--long`
    pub long_format: bool,
    /// `-h`
    pub human_readable: bool,
}

/// `virt-filesystems target [display flags]`
#[must_use]
pub fn virt_filesystems(target: &Target, opts: &FilesystemsOpts) -> ToolCommand {
    ToolCommand::new("virt-filesystems")
        .target(target)
        .flag("--all", opts.all)
        .flag("--filesystems", opts.filesystems)
        .flag("--extra", opts.extra)
        .flag("--partitions", opts.partitions)
        .flag("--block-devices", opts.block_devices)
        .flag("--logical-volumes", opts.logical_volumes)
        .flag("--volume-groups", opts.volume_groups)
        .flag("--physical-volumes", opts.physical_volumes)
        .flag("--long", opts.long_format)
        .flag("-h", opts.human_readable)
}

/// `virt-list-partitions target [--long] [--total] [--human-readable]`
#[must_use]
pub fn virt_list_partitions(
    target: &Target,
    long: bool,
    total: bool,
    human_readable: bool,
) -> ToolCommand {
    ToolCommand::new("virt-list-partitions")
        .arg(target.value())
        .flag("--long", long)
        .flag("--total", total)
        .flag("--human-readable", human_readable)
}

/// `virt-list-filesystems target [--format fmt] [--long] [--all]`
#[must_use]
pub fn virt_list_filesystems(
    target: &Target,
    format: Option<&str>,
    long: bool,
    all: bool,
) -> ToolCommand {
    ToolCommand::new("virt-list-filesystems")
        .arg(target.value())
        .opt("--format", format)
        .flag("--long", long)
        .flag("--all", all)
}

/// `virt-tar-in target tarfile destination`
#[must_use]
pub fn virt_tar_in(target: &Target, tar_file: &str, destination: &str) -> ToolCommand {
    ToolCommand::new("virt-tar-in")
        .target(target)
        .arg(tar_file)
        .arg(destination)
}

/// `virt-tar-out target directory tarfile`
#[must_use]
pub fn virt_tar_out(target: &Target, directory: &str, tar_file: &str) -> ToolCommand {
    ToolCommand::new("virt-tar-out")
        .target(target)
        .arg(directory)
        .arg(tar_file)
}

/// `virt-copy-in target file... destination`
///
/// # Errors
///
/// Returns [`ToolError::InvalidArguments`] when `files` is empty.
pub fn virt_copy_in(target: &Target, files: &[String], destination: &str) -> ToolResult<ToolCommand> {
    if files.is_empty() {
        return Err(ToolError::InvalidArguments {
            tool: "virt-copy-in".to_string(),
            reason: "at least one local file is required".to_string(),
        });
    }
    Ok(ToolCommand::new("virt-copy-in")
        .target(target)
        .args(files.iter().cloned())
        .arg(destination))
}

/// `virt-copy-out target path localdir`
#[must_use]
pub fn virt_copy_out(target: &Target, file_path: &str, local_dir: &str) -> ToolCommand {
    ToolCommand::new("virt-copy-out")
        .target(target)
        .arg(file_path)
        .arg(local_dir)
}

/// Options for `virt-format`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatOpts {
    /// `--filesystem=`
    pub filesystem: Option<String>,
    /// `--format=` (image format)
    pub image_format: Option<String>,
    /// `--lvm=`
    pub lvm: Option<String>,
    /// `--partition=`
    pub partition: Option<String>,
    /// `--wipe`
    pub wipe: bool,
}

/// `virt-format [options] -a disk`
#[must_use]
pub fn virt_format(disk: &Path, opts: &FormatOpts) -> ToolCommand {
    ToolCommand::new("virt-format")
        .opt_eq("--filesystem", opts.filesystem.as_deref())
        .opt_eq("--format", opts.image_format.as_deref())
        .opt_eq("--lvm", opts.lvm.as_deref())
        .opt_eq("--partition", opts.partition.as_deref())
        .flag("--wipe", opts.wipe)
        .arg("-a")
        .arg(disk.to_string_lossy())
}

/// `<inspector> target`; `program` is `virt-inspector2` when available
#[must_use]
pub fn virt_inspector(program: &str, target: &Target) -> ToolCommand {
    ToolCommand::new(program).target(target)
}

/// `virt-sysprep target [extra...]`
#[must_use]
pub fn virt_sysprep(target: &Target, extra: &[String]) -> ToolCommand {
    ToolCommand::new("virt-sysprep")
        .target(target)
        .args(extra.iter().cloned())
        .with_timeout(Duration::from_secs(SYSPREP_TIMEOUT_SECS))
}

/// `virt-sysprep --list-operations`
#[must_use]
pub fn virt_sysprep_list_operations() -> ToolCommand {
    ToolCommand::new("virt-sysprep").arg("--list-operations")
}

/// Parses `virt-sysprep --list-operations` output into name → description
///
/// Lines look like `bash-history * Remove the bash history in the guest`.
#[must_use]
pub fn parse_sysprep_operations(output: &str) -> BTreeMap<String, String> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            let name = line.split('*').next().unwrap_or_default().trim();
            let desc = line.rsplit('*').next().unwrap_or_default().trim();
            (name.to_string(), desc.to_string())
        })
        .collect()
}

/// Options for `virt-edit`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOpts {
    /// `-c uri`
    pub connect_uri: Option<String>,
    /// `--format=` (disk targets only; must precede `-a`)
    pub disk_format: Option<String>,
    /// `-e expr`
    pub expr: Option<String>,
    /// Extra arguments appended after the file
    pub extra: Vec<String>,
}

/// `virt-edit [-c uri] [--format=fmt] (-a|-d) target file [extra...] [-e expr]`
#[must_use]
pub fn virt_edit(target: &Target, file_path: &str, opts: &EditOpts) -> ToolCommand {
    let mut cmd = ToolCommand::new("virt-edit").opt("-c", opts.connect_uri.as_deref());
    if matches!(target, Target::Disk(_)) {
        cmd = cmd.opt_eq("--format", opts.disk_format.as_deref());
    }
    cmd.target(target)
        .arg(file_path)
        .args(opts.extra.iter().cloned())
        .opt("-e", opts.expr.as_deref())
}

/// Options for `virt-sparsify`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SparsifyOpts {
    /// `--compress`
    pub compress: bool,
    /// `--convert fmt`
    pub convert: Option<String>,
    /// `--format fmt` (input format)
    pub format: Option<String>,
}

/// `virt-sparsify [--compress] [--format fmt] indisk [--convert fmt] outdisk`
#[must_use]
pub fn virt_sparsify(indisk: &str, outdisk: &str, opts: &SparsifyOpts) -> ToolCommand {
    ToolCommand::new("virt-sparsify")
        .flag("--compress", opts.compress)
        .opt("--format", opts.format.as_deref())
        .arg(indisk)
        .opt("--convert", opts.convert.as_deref())
        .arg(outdisk)
}

/// Options for `virt-resize`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeOpts {
    /// `--resize part=size`; the size defaults to `0`
    pub resize: Option<(String, Option<String>)>,
    /// `--expand part`
    pub expand: Option<String>,
    /// `--shrink part`
    pub shrink: Option<String>,
    /// `--ignore part`
    pub ignore: Option<String>,
    /// `--delete part`
    pub delete: Option<String>,
}

/// `virt-resize [options] indisk outdisk`
#[must_use]
pub fn virt_resize(indisk: &str, outdisk: &str, opts: &ResizeOpts) -> ToolCommand {
    let mut cmd = ToolCommand::new("virt-resize");
    if let Some((part, size)) = &opts.resize {
        let size = size.as_deref().unwrap_or("0");
        cmd = cmd.arg("--resize").arg(format!("{part}={size}"));
    }
    cmd.opt("--expand", opts.expand.as_deref())
        .opt("--shrink", opts.shrink.as_deref())
        .opt("--ignore", opts.ignore.as_deref())
        .opt("--delete", opts.delete.as_deref())
        .arg(indisk)
        .arg(outdisk)
}

/// Options for `guestmount`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestmountOpts {
    /// `-i`
    pub inspector: bool,
    /// `--ro`
    pub read_only: bool,
    /// `-m dev[:mountpoint]`, repeated
    pub mounts: Vec<String>,
}

/// `guestmount (-a|-d) target [-i] [--ro] [-m spec...] mountpoint`
#[must_use]
pub fn guestmount(target: &Target, mountpoint: &str, opts: &GuestmountOpts) -> ToolCommand {
    let mut cmd = ToolCommand::new("guestmount")
        .target(target)
        .flag("-i", opts.inspector)
        .flag("--ro", opts.read_only);
    for spec in &opts.mounts {
        cmd = cmd.arg("-m").arg(spec.clone());
    }
    cmd.arg(mountpoint)
}

/// `libguestfs-test-tool [--qemu q] [--qemudir d] [--timeout n]`
#[must_use]
pub fn libguestfs_test_tool(
    qemu: Option<&str>,
    qemudir: Option<&str>,
    timeout_secs: Option<u64>,
) -> ToolCommand {
    let timeout = timeout_secs.map(|t| t.to_string());
    ToolCommand::new("libguestfs-test-tool")
        .opt("--qemu", qemu)
        .opt("--qemudir", qemudir)
        .opt("--timeout", timeout.as_deref())
}

/// Options for `virt-clone`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneOpts {
    /// `--name`
    pub new_name: Option<String>,
    /// `--auto-clone`
    pub auto_clone: bool,
    /// `--file`, repeated
    pub files: Vec<String>,
    /// `--nonsparse`
    pub nonsparse: bool,
    /// `--mac`
    pub mac: Option<String>,
}

/// `virt-clone --original dom [options]`
#[must_use]
pub fn virt_clone(original: &str, opts: &CloneOpts) -> ToolCommand {
    let mut cmd = ToolCommand::new("virt-clone")
        .arg("--original")
        .arg(original)
        .opt("--name", opts.new_name.as_deref())
        .flag("--auto-clone", opts.auto_clone);
    for file in &opts.files {
        cmd = cmd.arg("--file").arg(file.clone());
    }
    cmd.flag("--nonsparse", opts.nonsparse)
        .opt("--mac", opts.mac.as_deref())
        .with_timeout(Duration::from_secs(CLONE_TIMEOUT_SECS))
}

/// `<tool> --help`
#[must_use]
pub fn help(program: &str) -> ToolCommand {
    ToolCommand::new(program).arg("--help")
}

/// Checks whether `--help` output documents `option`
///
/// The option must appear as a separate word, so `--add` does not match
/// `--addxxx`.
///
/// # Errors
///
/// Returns [`ToolError::InvalidArguments`] if `option` does not start with `-`.
pub fn help_contains_option(tool: &str, help_text: &str, option: &str) -> ToolResult<bool> {
    let option = option.trim();
    if !option.starts_with('-') {
        return Err(ToolError::InvalidArguments {
            tool: tool.to_string(),
            reason: format!("option should look like '--a' or '-a', not '{option}'"),
        });
    }

    let needle = format!(" {option} ");
    Ok(help_text
        .lines()
        .any(|line| format!(" {} ", line.replace(',', " ")).contains(&needle)))
}
