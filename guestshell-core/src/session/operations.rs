//! Typed guestfish operations on [`SessionManager`]
//!
//! Each method formats one inner command and runs it through
//! [`SessionManager::inner_cmd`], so the `ignore_status` policy and the
//! session checks apply uniformly.

use super::manager::SessionManager;
use crate::command::inner::{self, AddDomainOpts, AddDriveOpts, InnerCommand, MkfsOpts};
use crate::error::SessionResult;
use crate::process::CommandResult;

/// Generates methods whose arguments are all plain positional strings
macro_rules! positional_ops {
    ($( $(#[$meta:meta])* $method:ident => $name:literal ( $($arg:ident),* ); )*) => {
        $(
            $(#[$meta])*
            ///
            /// # Errors
            ///
            /// Fails like [`SessionManager::inner_cmd`].
            pub fn $method(&mut self, $($arg: &str),*) -> SessionResult<CommandResult> {
                self.inner_cmd(&inner::positional::<&str>($name, &[$($arg),*]))
            }
        )*
    };
}

impl SessionManager {
    positional_ops! {
        // Handle state
        /// `launch`: starts the appliance
        launch => "launch" ();
        /// `is-config`
        is_config => "is-config" ();
        /// `is-ready`
        is_ready => "is-ready" ();
        /// `version`
        version => "version" ();
        /// `sync`
        sync => "sync" ();
        /// `set-backend`
        set_backend => "set-backend" (backend);
        /// `get-backend`
        get_backend => "get-backend" ();

        // Mounts
        /// `mount`
        mount => "mount" (mountable, mountpoint);
        /// `mount-ro`
        mount_ro => "mount-ro" (mountable, mountpoint);
        /// `mount-options`
        mount_options => "mount-options" (options, mountable, mountpoint);
        /// `mount-vfs`
        mount_vfs => "mount-vfs" (options, vfstype, mountable, mountpoint);
        /// `mounts`
        mounts => "mounts" ();
        /// `mountpoints`
        mountpoints => "mountpoints" ();
        /// `umount-all`
        umount_all => "umount-all" ();

        // Files
        /// `read-file`
        read_file => "read-file" (path);
        /// `cat`
        cat => "cat" (path);
        /// `write`: replaces the file content
        write => "write" (path, content);
        /// `write-append`
        write_append => "write-append" (path, content);
        /// `touch`
        touch => "touch" (path);
        /// `mkdir`
        mkdir => "mkdir" (path);
        /// `mkdir-p`
        mkdir_p => "mkdir-p" (path);
        /// `rm`
        rm => "rm" (path);
        /// `rm-rf`
        rm_rf => "rm-rf" (path);
        /// `cp`
        cp => "cp" (src, dest);
        /// `ls`
        ls => "ls" (directory);
        /// `ll`
        ll => "ll" (directory);
        /// `exists`
        exists => "exists" (path);
        /// `filesize`
        filesize => "filesize" (path);
        /// `stat`
        stat => "stat" (path);
        /// `download`: guest file to host file
        download => "download" (remote_file, host_file);
        /// `upload`: host file to guest file
        upload => "upload" (host_file, remote_file);
        /// `copy-in`
        copy_in => "copy-in" (local_path, remote_dir);
        /// `copy-out`
        copy_out => "copy-out" (remote_path, local_dir);
        /// `tar-out`
        tar_out => "tar-out" (directory, tarfile);
        /// `grep`
        grep => "grep" (regex, path);
        /// `egrep`
        egrep => "egrep" (regex, path);
        /// `fgrep`
        fgrep => "fgrep" (pattern, path);
        /// `grepi`
        grepi => "grepi" (regex, path);
        /// `zgrep`
        zgrep => "zgrep" (regex, path);
        /// `tail`
        tail => "tail" (path);

        // Devices and partitions
        /// `list-devices`
        list_devices => "list-devices" ();
        /// `list-partitions`
        list_partitions => "list-partitions" ();
        /// `list-filesystems`
        list_filesystems => "list-filesystems" ();
        /// `part-init`: `parttype` is `mbr` or `gpt`
        part_init => "part-init" (device, parttype);
        /// `part-disk`
        part_disk => "part-disk" (device, parttype);
        /// `part-list`
        part_list => "part-list" (device);
        /// `blockdev-getsize64`
        blockdev_getsize64 => "blockdev-getsize64" (device);

        // LVM
        /// `pvcreate`
        pvcreate => "pvcreate" (device);
        /// `pvs`
        pvs => "pvs" ();
        /// `vgs`
        vgs => "vgs" ();
        /// `lvs`
        lvs => "lvs" ();
        /// `lvremove`
        lvremove => "lvremove" (device);
        /// `vgremove`
        vgremove => "vgremove" (vgname);

        // Inspection
        /// `inspect-os`
        inspect_os => "inspect-os" ();
        /// `inspect-get-type`
        inspect_get_type => "inspect-get-type" (root);
        /// `inspect-get-distro`
        inspect_get_distro => "inspect-get-distro" (root);
        /// `inspect-get-product-name`
        inspect_get_product_name => "inspect-get-product-name" (root);
        /// `inspect-get-major-version`
        inspect_get_major_version => "inspect-get-major-version" (root);
        /// `inspect-get-minor-version`
        inspect_get_minor_version => "inspect-get-minor-version" (root);
        /// `inspect-get-hostname`
        inspect_get_hostname => "inspect-get-hostname" (root);
        /// `inspect-get-arch`
        inspect_get_arch => "inspect-get-arch" (root);
        /// `inspect-get-mountpoints`
        inspect_get_mountpoints => "inspect-get-mountpoints" (root);

        // Integrity
        /// `checksum`: `csumtype` is e.g. `md5` or `sha256`
        checksum => "checksum" (csumtype, path);
        /// `checksum-device`
        checksum_device => "checksum-device" (csumtype, device);
        /// `compress-out`
        compress_out => "compress-out" (ctype, file, zfile);
    }

    // ========== Drives ==========

    /// `add-drive filename`
    ///
    /// # Errors
    ///
    /// Fails like [`SessionManager::inner_cmd`].
    pub fn add_drive(&mut self, filename: &str) -> SessionResult<CommandResult> {
        self.inner_cmd(&inner::add_drive(filename))
    }

    /// `add-drive-opts filename [opt:value ...]`
    ///
    /// # Errors
    ///
    /// Fails like [`SessionManager::inner_cmd`].
    pub fn add_drive_opts(
        &mut self,
        filename: &str,
        opts: &AddDriveOpts,
    ) -> SessionResult<CommandResult> {
        self.inner_cmd(&inner::add_drive_opts(filename, opts))
    }

    /// `add-drive-ro filename`
    ///
    /// # Errors
    ///
    /// Fails like [`SessionManager::inner_cmd`].
    pub fn add_drive_ro(&mut self, filename: &str) -> SessionResult<CommandResult> {
        self.inner_cmd(&inner::add_drive_ro(filename))
    }

    /// `add-domain dom [opt:value ...]`
    ///
    /// # Errors
    ///
    /// Fails like [`SessionManager::inner_cmd`].
    pub fn add_domain(&mut self, domain: &str, opts: &AddDomainOpts) -> SessionResult<CommandResult> {
        self.inner_cmd(&inner::add_domain(domain, opts))
    }

    // ========== Mounts ==========

    /// `umount pathordevice [force:…] [lazyunmount:…]`
    ///
    /// # Errors
    ///
    /// Fails like [`SessionManager::inner_cmd`].
    pub fn umount(
        &mut self,
        path_or_device: &str,
        force: Option<bool>,
        lazy: Option<bool>,
    ) -> SessionResult<CommandResult> {
        self.inner_cmd(&inner::umount(path_or_device, force, lazy))
    }

    // ========== Files ==========

    /// `is-file path`
    ///
    /// # Errors
    ///
    /// Fails like [`SessionManager::inner_cmd`].
    pub fn is_file(&mut self, path: &str, follow_symlinks: Option<bool>) -> SessionResult<CommandResult> {
        self.inner_cmd(&inner::is_kind("file", path, follow_symlinks))
    }

    /// `is-dir path`
    ///
    /// # Errors
    ///
    /// Fails like [`SessionManager::inner_cmd`].
    pub fn is_dir(&mut self, path: &str, follow_symlinks: Option<bool>) -> SessionResult<CommandResult> {
        self.inner_cmd(&inner::is_kind("dir", path, follow_symlinks))
    }

    /// `chmod mode path`; the mode is sent in octal
    ///
    /// # Errors
    ///
    /// Fails like [`SessionManager::inner_cmd`].
    pub fn chmod(&mut self, mode: u32, path: &str) -> SessionResult<CommandResult> {
        self.inner_cmd(
            &InnerCommand::new("chmod")
                .arg(format!("0{mode:o}"))
                .arg(path)
                .build(),
        )
    }

    /// `chown owner group path`
    ///
    /// # Errors
    ///
    /// Fails like [`SessionManager::inner_cmd`].
    pub fn chown(&mut self, owner: u32, group: u32, path: &str) -> SessionResult<CommandResult> {
        self.inner_cmd(
            &InnerCommand::new("chown")
                .arg(owner)
                .arg(group)
                .arg(path)
                .build(),
        )
    }

    /// `head-n nrlines path`
    ///
    /// # Errors
    ///
    /// Fails like [`SessionManager::inner_cmd`].
    pub fn head_n(&mut self, lines: i64, path: &str) -> SessionResult<CommandResult> {
        self.inner_cmd(&InnerCommand::new("head-n").arg(lines).arg(path).build())
    }

    /// `tar-in-opts tarfile directory [compress:…]`
    ///
    /// # Errors
    ///
    /// Fails like [`SessionManager::inner_cmd`].
    pub fn tar_in_opts(
        &mut self,
        tarfile: &str,
        directory: &str,
        compress: Option<&str>,
    ) -> SessionResult<CommandResult> {
        self.inner_cmd(&inner::tar_in_opts(tarfile, directory, compress))
    }

    // ========== Partitions and filesystems ==========

    /// `part-add device prlogex startsect endsect`
    ///
    /// # Errors
    ///
    /// Fails like [`SessionManager::inner_cmd`].
    pub fn part_add(
        &mut self,
        device: &str,
        prlogex: &str,
        start_sector: i64,
        end_sector: i64,
    ) -> SessionResult<CommandResult> {
        self.inner_cmd(
            &InnerCommand::new("part-add")
                .arg(device)
                .arg(prlogex)
                .arg(start_sector)
                .arg(end_sector)
                .build(),
        )
    }

    /// `part-del device partnum`
    ///
    /// # Errors
    ///
    /// Fails like [`SessionManager::inner_cmd`].
    pub fn part_del(&mut self, device: &str, partnum: u32) -> SessionResult<CommandResult> {
        self.inner_cmd(&InnerCommand::new("part-del").arg(device).arg(partnum).build())
    }

    /// `part-set-bootable device partnum bootable`
    ///
    /// # Errors
    ///
    /// Fails like [`SessionManager::inner_cmd`].
    pub fn part_set_bootable(
        &mut self,
        device: &str,
        partnum: u32,
        bootable: bool,
    ) -> SessionResult<CommandResult> {
        self.inner_cmd(
            &InnerCommand::new("part-set-bootable")
                .arg(device)
                .arg(partnum)
                .arg(bootable)
                .build(),
        )
    }

    /// `mkfs fstype device [opt:value ...]`
    ///
    /// # Errors
    ///
    /// Fails like [`SessionManager::inner_cmd`].
    pub fn mkfs(&mut self, fstype: &str, device: &str, opts: &MkfsOpts) -> SessionResult<CommandResult> {
        self.inner_cmd(&inner::mkfs(fstype, device, opts))
    }

    /// `mkswap device [label:…] [uuid:…]`
    ///
    /// # Errors
    ///
    /// Fails like [`SessionManager::inner_cmd`].
    pub fn mkswap(
        &mut self,
        device: &str,
        label: Option<&str>,
        uuid: Option<&str>,
    ) -> SessionResult<CommandResult> {
        self.inner_cmd(&inner::mkswap(device, label, uuid))
    }

    // ========== LVM ==========

    /// `vgcreate volgroup physvols`; the volumes are sent space-separated
    ///
    /// # Errors
    ///
    /// Fails like [`SessionManager::inner_cmd`].
    pub fn vgcreate(&mut self, volgroup: &str, physvols: &[&str]) -> SessionResult<CommandResult> {
        self.inner_cmd(
            &InnerCommand::new("vgcreate")
                .arg(volgroup)
                .arg(physvols.join(" "))
                .build(),
        )
    }

    /// `lvcreate logvol volgroup mbytes`
    ///
    /// # Errors
    ///
    /// Fails like [`SessionManager::inner_cmd`].
    pub fn lvcreate(&mut self, logvol: &str, volgroup: &str, mbytes: u64) -> SessionResult<CommandResult> {
        self.inner_cmd(
            &InnerCommand::new("lvcreate")
                .arg(logvol)
                .arg(volgroup)
                .arg(mbytes)
                .build(),
        )
    }

    /// `lvresize device mbytes`
    ///
    /// # Errors
    ///
    /// Fails like [`SessionManager::inner_cmd`].
    pub fn lvresize(&mut self, device: &str, mbytes: u64) -> SessionResult<CommandResult> {
        self.inner_cmd(&InnerCommand::new("lvresize").arg(device).arg(mbytes).build())
    }

    // ========== Pass-through ==========

    /// `echo [params]`
    ///
    /// # Errors
    ///
    /// Fails like [`SessionManager::inner_cmd`].
    pub fn echo(&mut self, params: Option<&str>) -> SessionResult<CommandResult> {
        self.inner_cmd(&inner::echo(params))
    }

    /// `sh command`: runs a shell command inside the appliance
    ///
    /// # Errors
    ///
    /// Fails like [`SessionManager::inner_cmd`].
    pub fn sh(&mut self, command: &str) -> SessionResult<CommandResult> {
        self.inner_cmd(&inner::positional("sh", &[command]))
    }

    /// `command argv`: runs a program inside the appliance
    ///
    /// # Errors
    ///
    /// Fails like [`SessionManager::inner_cmd`].
    pub fn command(&mut self, argv: &[&str]) -> SessionResult<CommandResult> {
        self.inner_cmd(&inner::positional("command", &[argv.join(" ")]))
    }
}
