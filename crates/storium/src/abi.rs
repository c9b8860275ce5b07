//! solidity interface of the storium registry
//!
//! calldata, return data and event logs are all derived from this one
//! declaration. struct names only matter on this side of the wire, the abi
//! sees plain tuples.

use alloy_sol_types::sol;

sol! {
    struct FileEntry {
        string fileName;
        string fileType;
        string ipfsHash;
        uint256 fileSize;
        uint256 uploadTime;
        address owner;
        bool isPublic;
        string description;
        string[] tags;
    }

    struct UserAccessEntry {
        address user;
        bool access;
    }

    struct FileAccessEntry {
        uint256 fileId;
        address user;
        bool hasAccess;
    }

    interface IStorium {
        function addFile(
            string fileName,
            string fileType,
            string ipfsHash,
            uint256 fileSize,
            bool isPublic,
            string description,
            string[] tags
        ) external;

        function getMyFiles() external view returns (FileEntry[] files);
        function getPublicFiles() external view returns (FileEntry[] files);
        function getUserFiles(address user) external view returns (FileEntry[] files);

        function allow(address user) external;
        function disallow(address user) external;
        function shareAccess() external view returns (UserAccessEntry[] entries);

        function deleteFile(uint256 fileId) external;
        function grantFileAccess(uint256 fileId, address user) external;
        function revokeFileAccess(uint256 fileId, address user) external;
        function getFileAccessList() external view returns (FileAccessEntry[] entries);
        function hasFileAccess(uint256 fileId, address user) external view returns (bool allowed);

        event FileUploaded(address indexed user, uint256 indexed fileId, string fileName, string ipfsHash);
        event AccessGranted(address indexed owner, address indexed user);
        event FileDeleted(address indexed user, uint256 indexed fileId);
        event FileAccessGranted(address indexed owner, address indexed user, uint256 indexed fileId);
        event FileAccessRevoked(address indexed owner, address indexed user, uint256 indexed fileId);
    }
}

#[cfg(test)]
mod tests {
    use super::IStorium;
    use alloy_primitives::keccak256;
    use alloy_sol_types::{SolCall, SolEvent};

    #[test]
    fn test_function_signatures() {
        assert_eq!(
            IStorium::addFileCall::SIGNATURE,
            "addFile(string,string,string,uint256,bool,string,string[])"
        );
        assert_eq!(IStorium::getMyFilesCall::SIGNATURE, "getMyFiles()");
        assert_eq!(IStorium::getUserFilesCall::SIGNATURE, "getUserFiles(address)");
        assert_eq!(
            IStorium::hasFileAccessCall::SIGNATURE,
            "hasFileAccess(uint256,address)"
        );
    }

    #[test]
    fn test_selector_is_keccak_prefix() {
        let hash = keccak256(IStorium::grantFileAccessCall::SIGNATURE.as_bytes());
        assert_eq!(&IStorium::grantFileAccessCall::SELECTOR[..], &hash[..4]);
    }

    #[test]
    fn test_event_topics() {
        assert_eq!(
            IStorium::FileUploaded::SIGNATURE,
            "FileUploaded(address,uint256,string,string)"
        );
        assert_eq!(
            IStorium::FileAccessRevoked::SIGNATURE_HASH,
            keccak256("FileAccessRevoked(address,address,uint256)")
        );
    }
}
