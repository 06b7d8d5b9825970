//! Builders for guestfish inner commands
//!
//! Every function here formats one line of the guestfish command language.
//! Positional arguments are quoted with [`guestfish_quote`]; optional
//! arguments use guestfish's `name:value` syntax and are appended only when
//! set.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::quote::guestfish_quote;

/// Incremental builder for one inner command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerCommand {
    line: String,
}

impl InnerCommand {
    /// Starts a command with the given guestfish command name
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            line: name.to_string(),
        }
    }

    /// Appends a positional argument
    #[must_use]
    pub fn arg(mut self, value: impl Display) -> Self {
        self.line.push(' ');
        self.line.push_str(&guestfish_quote(&value.to_string()));
        self
    }

    /// Appends several positional arguments
    #[must_use]
    pub fn args<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Display,
    {
        for value in values {
            self = self.arg(value);
        }
        self
    }

    /// Appends `name:value` when `value` is set
    #[must_use]
    pub fn opt<V: Display>(mut self, name: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            let pair = format!("{name}:{value}");
            self.line.push(' ');
            self.line.push_str(&guestfish_quote(&pair));
        }
        self
    }

    /// Appends `name:true` or `name:false`
    #[must_use]
    pub fn bool_opt(self, name: &str, value: bool) -> Self {
        self.opt(name, Some(value))
    }

    /// Appends `name:true` only when `value` is true
    #[must_use]
    pub fn flag(self, name: &str, value: bool) -> Self {
        if value { self.opt(name, Some(true)) } else { self }
    }

    /// Returns the finished line
    #[must_use]
    pub fn build(self) -> String {
        self.line
    }
}

/// Builds a command that takes no arguments
#[must_use]
pub fn bare(name: &str) -> String {
    InnerCommand::new(name).build()
}

/// Builds a command with only positional arguments
#[must_use]
pub fn positional<S: Display>(name: &str, args: &[S]) -> String {
    InnerCommand::new(name).args(args).build()
}

// ========== Drives ==========

/// Optional arguments of `add-drive-opts`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddDriveOpts {
    /// Always emitted as `readonly:true|false`
    pub readonly: bool,
    /// Disk format, e.g. `raw` or `qcow2`
    pub format: Option<String>,
    /// Drive interface, e.g. `virtio`
    pub iface: Option<String>,
    /// Device name hint
    pub name: Option<String>,
    /// Drive label
    pub label: Option<String>,
    /// Network protocol (`nbd`, `iscsi`, ...)
    pub protocol: Option<String>,
    /// Network server
    pub server: Option<String>,
    /// Network user name
    pub username: Option<String>,
    /// Network secret
    pub secret: Option<String>,
    /// `cache` or `unsafe`
    pub cachemode: Option<String>,
    /// `disable`, `enable` or `besteffort`
    pub discard: Option<String>,
    /// Emitted only when true
    pub copyonread: bool,
}

impl AddDriveOpts {
    /// Options for a read-only drive
    #[must_use]
    pub fn read_only() -> Self {
        Self {
            readonly: true,
            ..Self::default()
        }
    }

    /// Sets the disk format
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Sets the drive interface
    #[must_use]
    pub fn with_iface(mut self, iface: impl Into<String>) -> Self {
        self.iface = Some(iface.into());
        self
    }

    /// Sets the drive label
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the network protocol and server
    #[must_use]
    pub fn with_remote(mut self, protocol: impl Into<String>, server: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self.server = Some(server.into());
        self
    }

    /// Enables copy-on-read
    #[must_use]
    pub const fn with_copyonread(mut self, copyonread: bool) -> Self {
        self.copyonread = copyonread;
        self
    }
}

/// `add-drive filename`
#[must_use]
pub fn add_drive(filename: &str) -> String {
    positional("add-drive", &[filename])
}

/// `add-drive-opts filename readonly:… [format:…] …`
#[must_use]
pub fn add_drive_opts(filename: &str, opts: &AddDriveOpts) -> String {
    InnerCommand::new("add-drive-opts")
        .arg(filename)
        .bool_opt("readonly", opts.readonly)
        .opt("format", opts.format.as_deref())
        .opt("iface", opts.iface.as_deref())
        .opt("name", opts.name.as_deref())
        .opt("label", opts.label.as_deref())
        .opt("protocol", opts.protocol.as_deref())
        .opt("server", opts.server.as_deref())
        .opt("username", opts.username.as_deref())
        .opt("secret", opts.secret.as_deref())
        .opt("cachemode", opts.cachemode.as_deref())
        .opt("discard", opts.discard.as_deref())
        .flag("copyonread", opts.copyonread)
        .build()
}

/// `add-drive-ro filename`
#[must_use]
pub fn add_drive_ro(filename: &str) -> String {
    positional("add-drive-ro", &[filename])
}

/// Optional arguments of `add-domain`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddDomainOpts {
    /// libvirt connection URI
    pub libvirturi: Option<String>,
    /// Always emitted as `readonly:true|false`
    pub readonly: bool,
    /// Drive interface
    pub iface: Option<String>,
    /// Emitted only when true
    pub live: bool,
    /// Emitted only when true
    pub allowuuid: bool,
    /// `error`, `read`, `write` or `ignore`
    pub readonlydisk: Option<String>,
}

/// `add-domain dom [libvirturi:…] readonly:… …`
#[must_use]
pub fn add_domain(domain: &str, opts: &AddDomainOpts) -> String {
    InnerCommand::new("add-domain")
        .arg(domain)
        .opt("libvirturi", opts.libvirturi.as_deref())
        .bool_opt("readonly", opts.readonly)
        .opt("iface", opts.iface.as_deref())
        .flag("live", opts.live)
        .flag("allowuuid", opts.allowuuid)
        .opt("readonlydisk", opts.readonlydisk.as_deref())
        .build()
}

// ========== Mounts ==========

/// `umount pathordevice [force:…] [lazyunmount:…]`
#[must_use]
pub fn umount(path_or_device: &str, force: Option<bool>, lazy: Option<bool>) -> String {
    InnerCommand::new("umount")
        .arg(path_or_device)
        .opt("force", force)
        .opt("lazyunmount", lazy)
        .build()
}

// ========== Files ==========

/// `tar-in-opts tarfile directory [compress:…]`
#[must_use]
pub fn tar_in_opts(tarfile: &str, directory: &str, compress: Option<&str>) -> String {
    InnerCommand::new("tar-in-opts")
        .arg(tarfile)
        .arg(directory)
        .opt("compress", compress)
        .build()
}

/// `is-<kind> path [followsymlinks:…]`
#[must_use]
pub fn is_kind(kind: &str, path: &str, follow_symlinks: Option<bool>) -> String {
    InnerCommand::new(&format!("is-{kind}"))
        .arg(path)
        .opt("followsymlinks", follow_symlinks)
        .build()
}

// ========== Filesystems ==========

/// Optional arguments of `mkfs`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MkfsOpts {
    /// Filesystem block size
    pub blocksize: Option<u64>,
    /// ext2/3/4 feature list
    pub features: Option<String>,
    /// Inode size
    pub inode: Option<u64>,
    /// Sector size (UFS)
    pub sectorsize: Option<u64>,
    /// Filesystem label
    pub label: Option<String>,
}

/// `mkfs fstype device [blocksize:…] [features:…] [inode:…] [sectorsize:…] [label:…]`
#[must_use]
pub fn mkfs(fstype: &str, device: &str, opts: &MkfsOpts) -> String {
    InnerCommand::new("mkfs")
        .arg(fstype)
        .arg(device)
        .opt("blocksize", opts.blocksize)
        .opt("features", opts.features.as_deref())
        .opt("inode", opts.inode)
        .opt("sectorsize", opts.sectorsize)
        .opt("label", opts.label.as_deref())
        .build()
}

/// `mkswap device [label:…] [uuid:…]`
#[must_use]
pub fn mkswap(device: &str, label: Option<&str>, uuid: Option<&str>) -> String {
    InnerCommand::new("mkswap")
        .arg(device)
        .opt("label", label)
        .opt("uuid", uuid)
        .build()
}

// ========== Miscellaneous ==========

/// `echo [params]`
#[must_use]
pub fn echo(params: Option<&str>) -> String {
    match params {
        Some(text) if !text.is_empty() => positional("echo", &[text]),
        _ => bare("echo"),
    }
}
