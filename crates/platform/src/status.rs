//! Status codes and the libssh2 result-code translator.
//!
//! Every fallible operation in coil reports a [`Status`]. Values greater than
//! or equal to zero are informational (a host-key comparison outcome, the end
//! of a known-hosts walk, or plain success); negative values are errors.
//!
//! [`Status::from_result`] is the single place where raw libssh2 return codes
//! are mapped into this enumeration. It is total: codes it does not know
//! become [`Status::Generic`].

use libssh2_sys as raw;
use std::fmt;
use std::os::raw::c_int;

// Older libssh2-sys releases do not export this one.
const LIBSSH2_ERROR_SOCKET_NONE: c_int = -1;

/// Result status of a coil operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Status {
    /// A host was found but its key differs.
    Mismatch = 4,
    /// Host and key match.
    Match = 3,
    /// No entry for the host.
    NotFound = 2,
    /// No more known-host entries.
    EndOfHosts = 1,
    /// Success.
    Ok = 0,
    /// Unknown or unmapped error.
    Generic = -1,
    /// Memory allocation failed.
    Alloc = -2,
    /// Memory release failed.
    Free = -3,
    /// A required value was missing.
    MissingValue = -4,
    /// Invalid socket.
    SocketNone = -5,
    /// Banner could not be received.
    BannerReceive = -6,
    /// Banner could not be sent.
    BannerSend = -7,
    /// Packet MAC was invalid.
    InvalidMac = -8,
    /// Key exchange failed.
    KexFailure = -9,
    /// Socket send failed.
    SocketSend = -10,
    /// Key exchange negotiation failed.
    KeyExchangeFailure = -11,
    /// Operation timed out.
    Timeout = -12,
    /// Host key could not be initialized.
    HostKeyInitialize = -13,
    /// Host key signature could not be verified.
    HostKeySignature = -14,
    /// Decryption failed.
    Decryption = -15,
    /// Socket was disconnected.
    SocketDisconnect = -16,
    /// Invalid protocol response.
    Protocol = -17,
    /// Password has expired.
    PasswordExpired = -18,
    /// Local file error.
    File = -19,
    /// No acceptable method.
    MethodNone = -20,
    /// Authentication failed.
    Authentication = -21,
    /// Public key was not verified.
    PublicKeyUnverified = -22,
    /// Channel packet out of order.
    ChannelOutOfOrder = -23,
    /// Channel operation failed.
    ChannelFailure = -24,
    /// Channel request denied.
    ChannelRequestDenied = -25,
    /// Unknown channel.
    ChannelUnknown = -26,
    /// Channel window exceeded.
    ChannelWindowExceeded = -27,
    /// Channel packet size exceeded.
    ChannelPacketExceeded = -28,
    /// Channel already closed.
    ChannelClosed = -29,
    /// EOF already sent on channel.
    ChannelEofSent = -30,
    /// SCP protocol error.
    ScpProtocol = -31,
    /// Compression stream error.
    Zlib = -32,
    /// Socket timed out.
    SocketTimeout = -33,
    /// SFTP protocol error.
    SftpProtocol = -34,
    /// Request denied by the remote end.
    RequestDenied = -35,
    /// Method not supported.
    MethodNotSupported = -36,
    /// Invalid argument.
    Invalid = -37,
    /// Invalid poll type.
    InvalidPollType = -38,
    /// Public key subsystem protocol error.
    PublicKeyProtocol = -39,
    /// Non-blocking call would block; call again.
    ExecuteAgain = -40,
    /// Buffer too small.
    BufferTooSmall = -41,
    /// API misuse.
    BadUse = -42,
    /// Compression failed.
    Compress = -43,
    /// Out of boundary access.
    OutOfBoundary = -44,
    /// Agent protocol error.
    AgentProtocol = -45,
    /// Socket receive failed.
    SocketReceive = -46,
    /// Encryption failed.
    Encryption = -47,
    /// Bad socket.
    BadSocket = -48,
    /// Known-hosts error.
    KnownHosts = -49,
    /// Unknown hash algorithm.
    UnknownHashAlgorithm = -50,
    /// Hash not available.
    HashUnavailable = -51,
    /// Unknown host name type.
    UnknownNameType = -52,
    /// Unknown key encoding.
    UnknownKeyEncoding = -53,
    /// Unknown key algorithm.
    UnknownKeyAlgorithm = -54,
    /// Unknown session mode.
    UnknownMode = -55,
    /// Unknown block direction.
    UnknownBlockDirection = -56,
    /// Unknown session option.
    UnknownSessionOption = -57,
    /// Session not started.
    SessionNotStarted = -58,
    /// libssh2 too old for the requested call.
    VersionTooOld = -59,
    /// Unknown extended data ignore mode.
    UnknownIgnoreMode = -60,
}

impl Status {
    /// Every status, informational values first.
    pub const ALL: [Status; 65] = [
        Status::Mismatch,
        Status::Match,
        Status::NotFound,
        Status::EndOfHosts,
        Status::Ok,
        Status::Generic,
        Status::Alloc,
        Status::Free,
        Status::MissingValue,
        Status::SocketNone,
        Status::BannerReceive,
        Status::BannerSend,
        Status::InvalidMac,
        Status::KexFailure,
        Status::SocketSend,
        Status::KeyExchangeFailure,
        Status::Timeout,
        Status::HostKeyInitialize,
        Status::HostKeySignature,
        Status::Decryption,
        Status::SocketDisconnect,
        Status::Protocol,
        Status::PasswordExpired,
        Status::File,
        Status::MethodNone,
        Status::Authentication,
        Status::PublicKeyUnverified,
        Status::ChannelOutOfOrder,
        Status::ChannelFailure,
        Status::ChannelRequestDenied,
        Status::ChannelUnknown,
        Status::ChannelWindowExceeded,
        Status::ChannelPacketExceeded,
        Status::ChannelClosed,
        Status::ChannelEofSent,
        Status::ScpProtocol,
        Status::Zlib,
        Status::SocketTimeout,
        Status::SftpProtocol,
        Status::RequestDenied,
        Status::MethodNotSupported,
        Status::Invalid,
        Status::InvalidPollType,
        Status::PublicKeyProtocol,
        Status::ExecuteAgain,
        Status::BufferTooSmall,
        Status::BadUse,
        Status::Compress,
        Status::OutOfBoundary,
        Status::AgentProtocol,
        Status::SocketReceive,
        Status::Encryption,
        Status::BadSocket,
        Status::KnownHosts,
        Status::UnknownHashAlgorithm,
        Status::HashUnavailable,
        Status::UnknownNameType,
        Status::UnknownKeyEncoding,
        Status::UnknownKeyAlgorithm,
        Status::UnknownMode,
        Status::UnknownBlockDirection,
        Status::UnknownSessionOption,
        Status::SessionNotStarted,
        Status::VersionTooOld,
        Status::UnknownIgnoreMode,
    ];

    /// Translates a libssh2 return code.
    ///
    /// Non-negative codes are success. Unmapped negative codes become
    /// [`Status::Generic`].
    ///
    /// # Example
    ///
    /// ```
    /// use coil_platform::Status;
    ///
    /// assert_eq!(Status::from_result(0), Status::Ok);
    /// assert_eq!(Status::from_result(-37), Status::ExecuteAgain);
    /// assert_eq!(Status::from_result(-9999), Status::Generic);
    /// ```
    pub fn from_result(code: c_int) -> Status {
        if code >= 0 {
            return Status::Ok;
        }

        match code {
            LIBSSH2_ERROR_SOCKET_NONE => Status::SocketNone,
            raw::LIBSSH2_ERROR_BANNER_RECV => Status::BannerReceive,
            raw::LIBSSH2_ERROR_BANNER_SEND => Status::BannerSend,
            raw::LIBSSH2_ERROR_INVALID_MAC => Status::InvalidMac,
            raw::LIBSSH2_ERROR_KEX_FAILURE => Status::KexFailure,
            raw::LIBSSH2_ERROR_ALLOC => Status::Alloc,
            raw::LIBSSH2_ERROR_SOCKET_SEND => Status::SocketSend,
            raw::LIBSSH2_ERROR_KEY_EXCHANGE_FAILURE => Status::KeyExchangeFailure,
            raw::LIBSSH2_ERROR_TIMEOUT => Status::Timeout,
            raw::LIBSSH2_ERROR_HOSTKEY_INIT => Status::HostKeyInitialize,
            raw::LIBSSH2_ERROR_HOSTKEY_SIGN => Status::HostKeySignature,
            raw::LIBSSH2_ERROR_DECRYPT => Status::Decryption,
            raw::LIBSSH2_ERROR_SOCKET_DISCONNECT => Status::SocketDisconnect,
            raw::LIBSSH2_ERROR_PROTO => Status::Protocol,
            raw::LIBSSH2_ERROR_PASSWORD_EXPIRED => Status::PasswordExpired,
            raw::LIBSSH2_ERROR_FILE => Status::File,
            raw::LIBSSH2_ERROR_METHOD_NONE => Status::MethodNone,
            raw::LIBSSH2_ERROR_AUTHENTICATION_FAILED => Status::Authentication,
            raw::LIBSSH2_ERROR_PUBLICKEY_UNVERIFIED => Status::PublicKeyUnverified,
            raw::LIBSSH2_ERROR_CHANNEL_OUTOFORDER => Status::ChannelOutOfOrder,
            raw::LIBSSH2_ERROR_CHANNEL_FAILURE => Status::ChannelFailure,
            raw::LIBSSH2_ERROR_CHANNEL_REQUEST_DENIED => Status::ChannelRequestDenied,
            raw::LIBSSH2_ERROR_CHANNEL_UNKNOWN => Status::ChannelUnknown,
            raw::LIBSSH2_ERROR_CHANNEL_WINDOW_EXCEEDED => Status::ChannelWindowExceeded,
            raw::LIBSSH2_ERROR_CHANNEL_PACKET_EXCEEDED => Status::ChannelPacketExceeded,
            raw::LIBSSH2_ERROR_CHANNEL_CLOSED => Status::ChannelClosed,
            raw::LIBSSH2_ERROR_CHANNEL_EOF_SENT => Status::ChannelEofSent,
            raw::LIBSSH2_ERROR_SCP_PROTOCOL => Status::ScpProtocol,
            raw::LIBSSH2_ERROR_ZLIB => Status::Zlib,
            raw::LIBSSH2_ERROR_SOCKET_TIMEOUT => Status::SocketTimeout,
            raw::LIBSSH2_ERROR_SFTP_PROTOCOL => Status::SftpProtocol,
            raw::LIBSSH2_ERROR_REQUEST_DENIED => Status::RequestDenied,
            raw::LIBSSH2_ERROR_METHOD_NOT_SUPPORTED => Status::MethodNotSupported,
            raw::LIBSSH2_ERROR_INVAL => Status::Invalid,
            raw::LIBSSH2_ERROR_INVALID_POLL_TYPE => Status::InvalidPollType,
            raw::LIBSSH2_ERROR_PUBLICKEY_PROTOCOL => Status::PublicKeyProtocol,
            raw::LIBSSH2_ERROR_EAGAIN => Status::ExecuteAgain,
            raw::LIBSSH2_ERROR_BUFFER_TOO_SMALL => Status::BufferTooSmall,
            raw::LIBSSH2_ERROR_BAD_USE => Status::BadUse,
            raw::LIBSSH2_ERROR_COMPRESS => Status::Compress,
            raw::LIBSSH2_ERROR_OUT_OF_BOUNDARY => Status::OutOfBoundary,
            raw::LIBSSH2_ERROR_AGENT_PROTOCOL => Status::AgentProtocol,
            raw::LIBSSH2_ERROR_SOCKET_RECV => Status::SocketReceive,
            raw::LIBSSH2_ERROR_ENCRYPT => Status::Encryption,
            raw::LIBSSH2_ERROR_BAD_SOCKET => Status::BadSocket,
            raw::LIBSSH2_ERROR_KNOWN_HOSTS => Status::KnownHosts,
            _ => Status::Generic,
        }
    }

    /// Translates an SFTP status code (`SSH_FX_*`).
    ///
    /// The SFTP layer reports its own code space; any non-zero code surfaces
    /// as [`Status::SftpProtocol`] and the raw code travels on the error.
    pub fn from_sftp(code: u32) -> Status {
        if code == 0 {
            Status::Ok
        } else {
            Status::SftpProtocol
        }
    }

    /// Looks up a status by its numeric value.
    pub fn from_code(code: i32) -> Option<Status> {
        Status::ALL.iter().copied().find(|s| s.code() == code)
    }

    /// Numeric value of this status.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Returns true for success and informational statuses.
    pub fn is_ok(self) -> bool {
        self.code() >= 0
    }

    /// Returns true for error statuses.
    pub fn is_err(self) -> bool {
        !self.is_ok()
    }

    /// Short name of the status.
    pub fn name(self) -> &'static str {
        match self {
            Status::Mismatch => "Mismatch",
            Status::Match => "Match",
            Status::NotFound => "Not Found",
            Status::EndOfHosts => "End of Hosts",
            Status::Ok => "No Error",
            Status::Generic => "Generic Error",
            Status::Alloc => "Memory Allocation Error",
            Status::Free => "Free Memory Error",
            Status::MissingValue => "Missing Value Error",
            Status::SocketNone => "Socket None Error",
            Status::BannerReceive => "Banner Receive Error",
            Status::BannerSend => "Banner Send Error",
            Status::InvalidMac => "Invalid MAC Error",
            Status::KexFailure => "Kex Failure Error",
            Status::SocketSend => "Socket Send Error",
            Status::KeyExchangeFailure => "Key Exchange Failure Error",
            Status::Timeout => "Timeout Error",
            Status::HostKeyInitialize => "Host Key Initialize Error",
            Status::HostKeySignature => "Host Key Signature Error",
            Status::Decryption => "Decryption Error",
            Status::SocketDisconnect => "Socket Disconnect Error",
            Status::Protocol => "Protocol Error",
            Status::PasswordExpired => "Password Expired Error",
            Status::File => "File Error",
            Status::MethodNone => "None Error",
            Status::Authentication => "Authentication Error",
            Status::PublicKeyUnverified => "Key Unverified Error",
            Status::ChannelOutOfOrder => "Channel Out of Order Error",
            Status::ChannelFailure => "Channel Failure Error",
            Status::ChannelRequestDenied => "Channel Request Denied Error",
            Status::ChannelUnknown => "Channel Unknown Error",
            Status::ChannelWindowExceeded => "Channel Window Exceeded Error",
            Status::ChannelPacketExceeded => "Channel Packet Exceeded Error",
            Status::ChannelClosed => "Channel Closed Error",
            Status::ChannelEofSent => "Channel EOF Sent Error",
            Status::ScpProtocol => "SCP Protocol Error",
            Status::Zlib => "zlib Error",
            Status::SocketTimeout => "Socket Timeout Error",
            Status::SftpProtocol => "SFTP Protocol Error",
            Status::RequestDenied => "Request Denied Error",
            Status::MethodNotSupported => "Method Not Supported Error",
            Status::Invalid => "Invalid Error",
            Status::InvalidPollType => "Invalid Poll Type Error",
            Status::PublicKeyProtocol => "Public Key Protocol Error",
            Status::ExecuteAgain => "Execute Again Error",
            Status::BufferTooSmall => "Buffer Too Small Error",
            Status::BadUse => "Bad Use Error",
            Status::Compress => "Compress Error",
            Status::OutOfBoundary => "Out of Boundary Error",
            Status::AgentProtocol => "Agent Protocol Error",
            Status::SocketReceive => "Socket Receive Error",
            Status::Encryption => "Encryption Error",
            Status::BadSocket => "Bad Socket Error",
            Status::KnownHosts => "Known Hosts Error",
            Status::UnknownHashAlgorithm => "Unknown Hash Algorithm Error",
            Status::HashUnavailable => "Hash Unavailable Error",
            Status::UnknownNameType => "Unknown Host Name Type Error",
            Status::UnknownKeyEncoding => "Unknown Key Encoding Error",
            Status::UnknownKeyAlgorithm => "Unknown Key Algorithm Error",
            Status::UnknownMode => "Unknown Mode Error",
            Status::UnknownBlockDirection => "Unknown Block Direction Error",
            Status::UnknownSessionOption => "Unknown Session Option Error",
            Status::SessionNotStarted => "Session Not Started Error",
            Status::VersionTooOld => "Version Too Old Error",
            Status::UnknownIgnoreMode => "Unknown Ignore Mode Error",
        }
    }

    /// Longer, human-readable description of the status.
    pub fn message(self) -> &'static str {
        match self {
            Status::Mismatch => "A host was found, but the keys did not match.",
            Status::Match => "The host and key match.",
            Status::NotFound => "No match for the host was found.",
            Status::EndOfHosts => "There are no more hosts.",
            Status::Ok => "The operation completed successfully.",
            Status::Generic => "An unknown or unmapped error occurred.",
            Status::Alloc => "Unable to allocate memory.",
            Status::Free => "Unable to release memory.",
            Status::MissingValue => "A required argument was missing or empty.",
            Status::SocketNone => "The socket is invalid.",
            Status::BannerReceive => "Unable to receive the banner from the remote host.",
            Status::BannerSend => "Unable to send the banner to the remote host.",
            Status::InvalidMac => "A packet with an invalid MAC was received.",
            Status::KexFailure => "The key exchange with the remote host failed.",
            Status::SocketSend => "Unable to send data on the socket.",
            Status::KeyExchangeFailure => "No common key exchange method could be negotiated.",
            Status::Timeout => "The operation timed out.",
            Status::HostKeyInitialize => "The host key could not be initialized.",
            Status::HostKeySignature => "The host key signature could not be verified.",
            Status::Decryption => "A received packet could not be decrypted.",
            Status::SocketDisconnect => "The socket was disconnected.",
            Status::Protocol => "An invalid SSH protocol response was received on the socket.",
            Status::PasswordExpired => "The password has expired.",
            Status::File => "A local file could not be read or written.",
            Status::MethodNone => "No acceptable method was offered.",
            Status::Authentication => "Authentication with the remote host failed.",
            Status::PublicKeyUnverified => "The public key was not verified by the remote host.",
            Status::ChannelOutOfOrder => "A channel packet arrived out of order.",
            Status::ChannelFailure => "The channel operation failed.",
            Status::ChannelRequestDenied => "The remote host denied the channel request.",
            Status::ChannelUnknown => "The channel is unknown to the remote host.",
            Status::ChannelWindowExceeded => "The channel window size was exceeded.",
            Status::ChannelPacketExceeded => "The channel packet size was exceeded.",
            Status::ChannelClosed => "The channel has been closed.",
            Status::ChannelEofSent => "End of file has already been sent on the channel.",
            Status::ScpProtocol => "The SCP transfer failed.",
            Status::Zlib => "The compression stream reported an error.",
            Status::SocketTimeout => "The socket timed out.",
            Status::SftpProtocol => "The SFTP server reported an error.",
            Status::RequestDenied => "The remote host denied the request.",
            Status::MethodNotSupported => "The requested method is not supported.",
            Status::Invalid => "An argument was invalid.",
            Status::InvalidPollType => "The poll type is invalid.",
            Status::PublicKeyProtocol => "The public key subsystem reported a protocol error.",
            Status::ExecuteAgain => {
                "The session is non-blocking and the call would block; call it again."
            }
            Status::BufferTooSmall => "The buffer is too small to hold the data.",
            Status::BadUse => "The call was made in an invalid state.",
            Status::Compress => "Compression failed.",
            Status::OutOfBoundary => "A read or write went out of bounds.",
            Status::AgentProtocol => "The SSH agent reported a protocol error.",
            Status::SocketReceive => "Unable to receive data on the socket.",
            Status::Encryption => "A packet could not be encrypted.",
            Status::BadSocket => "The socket is not usable.",
            Status::KnownHosts => "The known hosts collection reported an error.",
            Status::UnknownHashAlgorithm => "The host key hash algorithm is unknown.",
            Status::HashUnavailable => {
                "The session has not been started, or the requested hash is not available."
            }
            Status::UnknownNameType => "The host name type is unknown.",
            Status::UnknownKeyEncoding => "The key encoding is unknown.",
            Status::UnknownKeyAlgorithm => "The key algorithm is unknown.",
            Status::UnknownMode => "The session mode is unknown.",
            Status::UnknownBlockDirection => "The block direction is unknown.",
            Status::UnknownSessionOption => "The session option is unknown.",
            Status::SessionNotStarted => "The session has not yet been started.",
            Status::VersionTooOld => "The linked libssh2 version is too old.",
            Status::UnknownIgnoreMode => "The ignore mode is unknown.",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<Status> for i32 {
    fn from(status: Status) -> i32 {
        status.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_translates_every_libssh2_error() {
        // Literal libssh2 codes so a renumbering upstream is caught here.
        let table: &[(c_int, Status)] = &[
            (-1, Status::SocketNone),
            (-2, Status::BannerReceive),
            (-3, Status::BannerSend),
            (-4, Status::InvalidMac),
            (-5, Status::KexFailure),
            (-6, Status::Alloc),
            (-7, Status::SocketSend),
            (-8, Status::KeyExchangeFailure),
            (-9, Status::Timeout),
            (-10, Status::HostKeyInitialize),
            (-11, Status::HostKeySignature),
            (-12, Status::Decryption),
            (-13, Status::SocketDisconnect),
            (-14, Status::Protocol),
            (-15, Status::PasswordExpired),
            (-16, Status::File),
            (-17, Status::MethodNone),
            (-18, Status::Authentication),
            (-19, Status::PublicKeyUnverified),
            (-20, Status::ChannelOutOfOrder),
            (-21, Status::ChannelFailure),
            (-22, Status::ChannelRequestDenied),
            (-23, Status::ChannelUnknown),
            (-24, Status::ChannelWindowExceeded),
            (-25, Status::ChannelPacketExceeded),
            (-26, Status::ChannelClosed),
            (-27, Status::ChannelEofSent),
            (-28, Status::ScpProtocol),
            (-29, Status::Zlib),
            (-30, Status::SocketTimeout),
            (-31, Status::SftpProtocol),
            (-32, Status::RequestDenied),
            (-33, Status::MethodNotSupported),
            (-34, Status::Invalid),
            (-35, Status::InvalidPollType),
            (-36, Status::PublicKeyProtocol),
            (-37, Status::ExecuteAgain),
            (-38, Status::BufferTooSmall),
            (-39, Status::BadUse),
            (-40, Status::Compress),
            (-41, Status::OutOfBoundary),
            (-42, Status::AgentProtocol),
            (-43, Status::SocketReceive),
            (-44, Status::Encryption),
            (-45, Status::BadSocket),
            (-46, Status::KnownHosts),
        ];

        for (code, expected) in table {
            assert_eq!(Status::from_result(*code), *expected, "code {}", code);
        }
    }

    #[test]
    fn test_unmapped_codes_are_generic() {
        for code in [-47, -51, -100, i32::MIN] {
            assert_eq!(Status::from_result(code), Status::Generic);
        }
    }

    #[test]
    fn test_non_negative_codes_are_ok() {
        for code in [0, 1, 4, 1024, i32::MAX] {
            assert_eq!(Status::from_result(code), Status::Ok);
        }
    }

    #[test]
    fn test_ok_and_err_partition() {
        for status in Status::ALL {
            assert_ne!(status.is_ok(), status.is_err(), "{:?}", status);
        }

        let ok: Vec<_> = Status::ALL.iter().filter(|s| s.is_ok()).collect();
        assert_eq!(ok.len(), 5);
        assert!(Status::EndOfHosts.is_ok());
        assert!(Status::Generic.is_err());
    }

    #[test]
    fn test_codes_round_trip_and_are_unique() {
        let mut seen = HashSet::new();
        for status in Status::ALL {
            assert!(seen.insert(status.code()));
            assert_eq!(Status::from_code(status.code()), Some(status));
        }
        assert_eq!(Status::from_code(5), None);
        assert_eq!(Status::from_code(-61), None);
    }

    #[test]
    fn test_names_and_messages() {
        let mut names = HashSet::new();
        for status in Status::ALL {
            assert!(!status.name().is_empty());
            assert!(!status.message().is_empty());
            assert!(names.insert(status.name()), "duplicate name {}", status);
        }
        assert_eq!(Status::Ok.to_string(), "No Error");
        assert_eq!(Status::EndOfHosts.name(), "End of Hosts");
    }

    #[test]
    fn test_sftp_translation() {
        assert_eq!(Status::from_sftp(0), Status::Ok);
        assert_eq!(Status::from_sftp(2), Status::SftpProtocol);
    }
}
