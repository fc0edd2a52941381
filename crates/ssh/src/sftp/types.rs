//! SFTP data types.

use std::fmt;

/// SFTP status codes (SSH_FX_*).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SftpErrorCode {
    /// SSH_FX_OK - Success
    Ok = 0,
    /// SSH_FX_EOF - End of file
    Eof = 1,
    /// SSH_FX_NO_SUCH_FILE - No such file
    NoSuchFile = 2,
    /// SSH_FX_PERMISSION_DENIED - Permission denied
    PermissionDenied = 3,
    /// SSH_FX_FAILURE - General failure
    Failure = 4,
    /// SSH_FX_BAD_MESSAGE - Bad message
    BadMessage = 5,
    /// SSH_FX_NO_CONNECTION - No connection
    NoConnection = 6,
    /// SSH_FX_CONNECTION_LOST - Connection lost
    ConnectionLost = 7,
    /// SSH_FX_OP_UNSUPPORTED - Operation not supported
    OpUnsupported = 8,
    /// SSH_FX_INVALID_HANDLE - Invalid handle
    InvalidHandle = 9,
    /// SSH_FX_NO_SUCH_PATH - No such path
    NoSuchPath = 10,
    /// SSH_FX_FILE_ALREADY_EXISTS - File already exists
    FileAlreadyExists = 11,
    /// SSH_FX_WRITE_PROTECT - Write protected
    WriteProtect = 12,
    /// SSH_FX_NO_MEDIA - No media
    NoMedia = 13,
    /// SSH_FX_NO_SPACE_ON_FILESYSTEM - No space left
    NoSpaceOnFilesystem = 14,
    /// SSH_FX_QUOTA_EXCEEDED - Quota exceeded
    QuotaExceeded = 15,
    /// SSH_FX_UNKNOWN_PRINCIPAL - Unknown principal
    UnknownPrincipal = 16,
    /// SSH_FX_LOCK_CONFLICT - Lock conflict
    LockConflict = 17,
    /// SSH_FX_DIR_NOT_EMPTY - Directory not empty
    DirNotEmpty = 18,
    /// SSH_FX_NOT_A_DIRECTORY - Not a directory
    NotADirectory = 19,
    /// SSH_FX_INVALID_FILENAME - Invalid file name
    InvalidFilename = 20,
    /// SSH_FX_LINK_LOOP - Too many symbolic links
    LinkLoop = 21,
}

impl SftpErrorCode {
    /// Convert from u32.
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Ok),
            1 => Some(Self::Eof),
            2 => Some(Self::NoSuchFile),
            3 => Some(Self::PermissionDenied),
            4 => Some(Self::Failure),
            5 => Some(Self::BadMessage),
            6 => Some(Self::NoConnection),
            7 => Some(Self::ConnectionLost),
            8 => Some(Self::OpUnsupported),
            9 => Some(Self::InvalidHandle),
            10 => Some(Self::NoSuchPath),
            11 => Some(Self::FileAlreadyExists),
            12 => Some(Self::WriteProtect),
            13 => Some(Self::NoMedia),
            14 => Some(Self::NoSpaceOnFilesystem),
            15 => Some(Self::QuotaExceeded),
            16 => Some(Self::UnknownPrincipal),
            17 => Some(Self::LockConflict),
            18 => Some(Self::DirNotEmpty),
            19 => Some(Self::NotADirectory),
            20 => Some(Self::InvalidFilename),
            21 => Some(Self::LinkLoop),
            _ => None,
        }
    }

    /// Returns error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Ok => "Success",
            Self::Eof => "End of file",
            Self::NoSuchFile => "No such file or directory",
            Self::PermissionDenied => "Permission denied",
            Self::Failure => "Failure",
            Self::BadMessage => "Bad message",
            Self::NoConnection => "No connection",
            Self::ConnectionLost => "Connection lost",
            Self::OpUnsupported => "Operation not supported",
            Self::InvalidHandle => "Invalid handle",
            Self::NoSuchPath => "No such path",
            Self::FileAlreadyExists => "File already exists",
            Self::WriteProtect => "Write protected",
            Self::NoMedia => "No media",
            Self::NoSpaceOnFilesystem => "No space left on filesystem",
            Self::QuotaExceeded => "Quota exceeded",
            Self::UnknownPrincipal => "Unknown principal",
            Self::LockConflict => "Lock conflict",
            Self::DirNotEmpty => "Directory not empty",
            Self::NotADirectory => "Not a directory",
            Self::InvalidFilename => "Invalid file name",
            Self::LinkLoop => "Too many levels of symbolic links",
        }
    }
}

impl fmt::Display for SftpErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message(), *self as u32)
    }
}

/// File type, from the type bits of a mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Named pipe
    NamedPipe,
    /// Character special file
    Special,
    /// Directory
    Directory,
    /// Block special file
    Block,
    /// Regular file
    Regular,
    /// Symbolic link
    Link,
    /// Socket
    Socket,
}

impl FileType {
    /// Extracts the file type from mode bits.
    pub fn from_mode(mode: u32) -> Option<Self> {
        match mode & FileMode::TYPE_MASK {
            FileMode::NAMED_PIPE => Some(FileType::NamedPipe),
            FileMode::CHARACTER => Some(FileType::Special),
            FileMode::DIRECTORY => Some(FileType::Directory),
            FileMode::BLOCK => Some(FileType::Block),
            FileMode::REGULAR => Some(FileType::Regular),
            FileMode::LINK => Some(FileType::Link),
            FileMode::SOCKET => Some(FileType::Socket),
            _ => None,
        }
    }

    /// Type bits for this file type.
    pub fn mode_bits(self) -> u32 {
        match self {
            FileType::NamedPipe => FileMode::NAMED_PIPE,
            FileType::Special => FileMode::CHARACTER,
            FileType::Directory => FileMode::DIRECTORY,
            FileType::Block => FileMode::BLOCK,
            FileType::Regular => FileMode::REGULAR,
            FileType::Link => FileMode::LINK,
            FileType::Socket => FileMode::SOCKET,
        }
    }
}

/// File open flags (SSH_FXF_*).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenFlags(pub u32);

impl OpenFlags {
    /// SSH_FXF_READ - Open for reading
    pub const READ: u32 = 0x00000001;
    /// SSH_FXF_WRITE - Open for writing
    pub const WRITE: u32 = 0x00000002;
    /// SSH_FXF_APPEND - Force writes to append
    pub const APPEND: u32 = 0x00000004;
    /// SSH_FXF_CREAT - Create if doesn't exist
    pub const CREATE: u32 = 0x00000008;
    /// SSH_FXF_TRUNC - Truncate to 0 length
    pub const TRUNCATE: u32 = 0x00000010;
    /// SSH_FXF_EXCL - Fail if file exists
    pub const EXCLUSIVE: u32 = 0x00000020;

    /// Read only.
    pub fn read() -> Self {
        Self(Self::READ)
    }

    /// Write, creating or truncating the file.
    pub fn write() -> Self {
        Self(Self::WRITE | Self::CREATE | Self::TRUNCATE)
    }

    /// Returns true if every bit of `flag` is set.
    pub fn contains(self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    pub(crate) fn to_ssh2(self) -> ssh2::OpenFlags {
        let mut flags = ssh2::OpenFlags::empty();
        for (bit, flag) in [
            (Self::READ, ssh2::OpenFlags::READ),
            (Self::WRITE, ssh2::OpenFlags::WRITE),
            (Self::APPEND, ssh2::OpenFlags::APPEND),
            (Self::CREATE, ssh2::OpenFlags::CREATE),
            (Self::TRUNCATE, ssh2::OpenFlags::TRUNCATE),
            (Self::EXCLUSIVE, ssh2::OpenFlags::EXCLUSIVE),
        ] {
            if self.contains(bit) {
                flags |= flag;
            }
        }
        flags
    }
}

/// File mode bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMode(pub u32);

impl FileMode {
    /// Mask of the file type bits
    pub const TYPE_MASK: u32 = 0o170000;
    /// Named pipe
    pub const NAMED_PIPE: u32 = 0o010000;
    /// Character special
    pub const CHARACTER: u32 = 0o020000;
    /// Directory
    pub const DIRECTORY: u32 = 0o040000;
    /// Block special
    pub const BLOCK: u32 = 0o060000;
    /// Regular file
    pub const REGULAR: u32 = 0o100000;
    /// Symbolic link
    pub const LINK: u32 = 0o120000;
    /// Socket
    pub const SOCKET: u32 = 0o140000;

    /// Owner read, write and execute
    pub const USER_RWX: u32 = 0o700;
    /// Owner read
    pub const USER_READ: u32 = 0o400;
    /// Owner write
    pub const USER_WRITE: u32 = 0o200;
    /// Owner execute
    pub const USER_EXEC: u32 = 0o100;
    /// Group read, write and execute
    pub const GROUP_RWX: u32 = 0o070;
    /// Group read
    pub const GROUP_READ: u32 = 0o040;
    /// Group write
    pub const GROUP_WRITE: u32 = 0o020;
    /// Group execute
    pub const GROUP_EXEC: u32 = 0o010;
    /// Others read, write and execute
    pub const OTHER_RWX: u32 = 0o007;
    /// Others read
    pub const OTHER_READ: u32 = 0o004;
    /// Others write
    pub const OTHER_WRITE: u32 = 0o002;
    /// Others execute
    pub const OTHER_EXEC: u32 = 0o001;

    /// Default file permissions (0644 = rw-r--r--)
    pub const DEFAULT_FILE: u32 = 0o644;
    /// Default directory permissions (0755 = rwxr-xr-x)
    pub const DEFAULT_DIR: u32 = 0o755;

    /// Permission bits without the type bits.
    pub fn permissions(self) -> u32 {
        self.0 & 0o7777
    }
}

impl Default for FileMode {
    fn default() -> Self {
        FileMode(Self::DEFAULT_FILE)
    }
}

/// Which attribute fields are present (SSH_FILEXFER_ATTR_*).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AttributeFlags(pub u32);

impl AttributeFlags {
    /// SSH_FILEXFER_ATTR_SIZE
    pub const SIZE: u32 = 0x00000001;
    /// SSH_FILEXFER_ATTR_UIDGID
    pub const UIDGID: u32 = 0x00000002;
    /// SSH_FILEXFER_ATTR_PERMISSIONS
    pub const PERMISSIONS: u32 = 0x00000004;
    /// SSH_FILEXFER_ATTR_ACMODTIME
    pub const ACMODTIME: u32 = 0x00000008;

    /// Returns true if every bit of `flag` is set.
    pub fn contains(self, flag: u32) -> bool {
        self.0 & flag == flag
    }
}

/// File attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Attributes {
    size: Option<u64>,
    uid: Option<u32>,
    gid: Option<u32>,
    permissions: Option<u32>,
    atime: Option<u64>,
    mtime: Option<u64>,
}

impl Attributes {
    /// Creates empty attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flags of the fields that are present.
    pub fn flags(&self) -> AttributeFlags {
        let mut flags = 0u32;
        if self.size.is_some() {
            flags |= AttributeFlags::SIZE;
        }
        if self.uid.is_some() || self.gid.is_some() {
            flags |= AttributeFlags::UIDGID;
        }
        if self.permissions.is_some() {
            flags |= AttributeFlags::PERMISSIONS;
        }
        if self.atime.is_some() || self.mtime.is_some() {
            flags |= AttributeFlags::ACMODTIME;
        }
        AttributeFlags(flags)
    }

    /// File size in bytes.
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Owner user ID.
    pub fn uid(&self) -> Option<u32> {
        self.uid
    }

    /// Owner group ID.
    pub fn gid(&self) -> Option<u32> {
        self.gid
    }

    /// Mode bits, including file type bits when the server sends them.
    pub fn permissions(&self) -> Option<u32> {
        self.permissions
    }

    /// Last access time, seconds since the epoch.
    pub fn atime(&self) -> Option<u64> {
        self.atime
    }

    /// Last modification time, seconds since the epoch.
    pub fn mtime(&self) -> Option<u64> {
        self.mtime
    }

    /// File type derived from the mode bits.
    pub fn file_type(&self) -> Option<FileType> {
        self.permissions.and_then(FileType::from_mode)
    }

    /// Returns true for a directory.
    pub fn is_dir(&self) -> bool {
        self.file_type() == Some(FileType::Directory)
    }

    /// Sets the file size.
    pub fn set_size(&mut self, size: u64) -> &mut Self {
        self.size = Some(size);
        self
    }

    /// Sets the owner user ID.
    pub fn set_uid(&mut self, uid: u32) -> &mut Self {
        self.uid = Some(uid);
        self
    }

    /// Sets the owner group ID.
    pub fn set_gid(&mut self, gid: u32) -> &mut Self {
        self.gid = Some(gid);
        self
    }

    /// Sets the mode bits.
    pub fn set_permissions(&mut self, permissions: u32) -> &mut Self {
        self.permissions = Some(permissions);
        self
    }

    /// Sets access and modification times.
    pub fn set_times(&mut self, atime: u64, mtime: u64) -> &mut Self {
        self.atime = Some(atime);
        self.mtime = Some(mtime);
        self
    }
}

impl From<ssh2::FileStat> for Attributes {
    fn from(stat: ssh2::FileStat) -> Self {
        Self {
            size: stat.size,
            uid: stat.uid,
            gid: stat.gid,
            permissions: stat.perm,
            atime: stat.atime,
            mtime: stat.mtime,
        }
    }
}

impl From<&Attributes> for ssh2::FileStat {
    fn from(attrs: &Attributes) -> Self {
        ssh2::FileStat {
            size: attrs.size,
            uid: attrs.uid,
            gid: attrs.gid,
            perm: attrs.permissions,
            atime: attrs.atime,
            mtime: attrs.mtime,
        }
    }
}
