use std::io::Write;
use std::sync::Arc;

use aws_sdk_s3::operation::create_bucket::{CreateBucketError, CreateBucketOutput};
use aws_sdk_s3::operation::head_bucket::{HeadBucketError, HeadBucketOutput};
use aws_sdk_s3::operation::put_object::PutObjectOutput;
use aws_sdk_s3::types::error::{BucketAlreadyOwnedByYou, NotFound};
use aws_sdk_s3::types::{BucketCannedAcl, BucketLocationConstraint, ObjectCannedAcl};
use aws_smithy_mocks::{mock, mock_client, RuleMode};

use dog_blob_upload::{
    BlobClient, BlobClientProvider, BlobUploader, DefaultBlobUploader, MemoryBlobStore, PublicAccess, RecyclingStreamPool,
    S3ClientProvider, UploadOptions,
};

fn uploader_over(provider: S3ClientProvider) -> DefaultBlobUploader {
    DefaultBlobUploader::new(
        Arc::new(provider),
        Arc::new(MemoryBlobStore::new()),
        Arc::new(RecyclingStreamPool::default()),
    )
}

#[tokio::test]
async fn missing_bucket_is_created_before_upload() {
    let head = mock!(aws_sdk_s3::Client::head_bucket)
        .match_requests(|req| req.bucket() == Some("docs"))
        .then_error(|| HeadBucketError::NotFound(NotFound::builder().build()));
    let create = mock!(aws_sdk_s3::Client::create_bucket)
        .match_requests(|req| req.bucket() == Some("docs") && req.acl().is_none())
        .then_output(|| CreateBucketOutput::builder().build());
    let put = mock!(aws_sdk_s3::Client::put_object)
        .match_requests(|req| req.bucket() == Some("docs") && req.key() == Some("a.txt"))
        .then_output(|| PutObjectOutput::builder().e_tag("\"abc\"").build());
    let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, [&head, &create, &put]);

    let uploader = uploader_over(S3ClientProvider::from_client(client, "us-east-1"));
    let receipt = uploader
        .upload_bytes("docs", "a.txt", b"hello", None, PublicAccess::None, None)
        .await
        .unwrap();

    assert_eq!(head.num_calls(), 1);
    assert_eq!(create.num_calls(), 1);
    assert_eq!(put.num_calls(), 1);
    assert_eq!(receipt.size_bytes, 5);
    assert_eq!(receipt.etag.as_deref(), Some("\"abc\""));
}

#[tokio::test]
async fn omitted_content_type_sends_no_header() {
    let head = mock!(aws_sdk_s3::Client::head_bucket).then_output(|| HeadBucketOutput::builder().build());
    let put = mock!(aws_sdk_s3::Client::put_object)
        .match_requests(|req| req.content_type().is_none() && req.acl().is_none())
        .then_output(|| PutObjectOutput::builder().build());
    let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, [&head, &put]);

    let uploader = uploader_over(S3ClientProvider::from_client(client, "us-east-1"));
    let receipt = uploader
        .upload_text("docs", "plain.txt", "plain", None, PublicAccess::None, None)
        .await
        .unwrap();

    assert_eq!(put.num_calls(), 1);
    assert_eq!(receipt.content_type, None);
}

#[tokio::test]
async fn given_content_type_is_sent() {
    let head = mock!(aws_sdk_s3::Client::head_bucket).then_output(|| HeadBucketOutput::builder().build());
    let create = mock!(aws_sdk_s3::Client::create_bucket).then_output(|| CreateBucketOutput::builder().build());
    let put = mock!(aws_sdk_s3::Client::put_object)
        .match_requests(|req| req.content_type() == Some("application/pdf") && req.content_length() == Some(4))
        .then_output(|| PutObjectOutput::builder().build());
    let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, [&head, &create, &put]);

    let uploader = uploader_over(S3ClientProvider::from_client(client, "us-east-1"));
    let receipt = uploader
        .upload_bytes("reports", "q1.pdf", b"%PDF", Some("application/pdf"), PublicAccess::None, None)
        .await
        .unwrap();

    assert_eq!(put.num_calls(), 1);
    assert_eq!(create.num_calls(), 0);
    assert_eq!(receipt.content_type.as_deref(), Some("application/pdf"));
}

#[tokio::test]
async fn bucket_already_owned_counts_as_created() {
    let head = mock!(aws_sdk_s3::Client::head_bucket)
        .then_error(|| HeadBucketError::NotFound(NotFound::builder().build()));
    let create = mock!(aws_sdk_s3::Client::create_bucket)
        .then_error(|| CreateBucketError::BucketAlreadyOwnedByYou(BucketAlreadyOwnedByYou::builder().build()));
    let put = mock!(aws_sdk_s3::Client::put_object).then_output(|| PutObjectOutput::builder().build());
    let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, [&head, &create, &put]);

    let uploader = uploader_over(S3ClientProvider::from_client(client, "us-east-1"));
    uploader
        .upload_bytes("raced", "a.bin", b"x", None, PublicAccess::None, None)
        .await
        .unwrap();

    assert_eq!(create.num_calls(), 1);
    assert_eq!(put.num_calls(), 1);
}

#[tokio::test]
async fn public_blob_access_maps_to_acls_and_region() {
    let head = mock!(aws_sdk_s3::Client::head_bucket)
        .then_error(|| HeadBucketError::NotFound(NotFound::builder().build()));
    let create = mock!(aws_sdk_s3::Client::create_bucket)
        .match_requests(|req| {
            req.acl() == Some(&BucketCannedAcl::Private)
                && req.create_bucket_configuration().and_then(|c| c.location_constraint())
                    == Some(&BucketLocationConstraint::EuWest1)
        })
        .then_output(|| CreateBucketOutput::builder().build());
    let put = mock!(aws_sdk_s3::Client::put_object)
        .match_requests(|req| req.acl() == Some(&ObjectCannedAcl::PublicRead))
        .then_output(|| PutObjectOutput::builder().build());
    let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, [&head, &create, &put]);

    let provider = S3ClientProvider::from_client(client, "eu-west-1");
    let blob = provider.get("assets", "logo.svg", PublicAccess::Blob, None).await.unwrap();
    assert_eq!(blob.container(), "assets");
    assert_eq!(blob.path(), "logo.svg");

    let stream = Box::pin(futures_util::stream::iter(vec![Ok::<_, std::io::Error>(bytes::Bytes::from_static(
        b"<svg/>",
    ))]));
    blob.upload(stream, UploadOptions::overwrite(None), None).await.unwrap();

    assert_eq!(create.num_calls(), 1);
    assert_eq!(put.num_calls(), 1);
}

#[tokio::test]
async fn file_upload_sends_file_length() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"from disk").unwrap();
    file.flush().unwrap();

    let head = mock!(aws_sdk_s3::Client::head_bucket).then_output(|| HeadBucketOutput::builder().build());
    let put = mock!(aws_sdk_s3::Client::put_object)
        .match_requests(|req| req.content_length() == Some(9) && req.content_type().is_none())
        .then_output(|| PutObjectOutput::builder().build());
    let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, [&head, &put]);

    let uploader = uploader_over(S3ClientProvider::from_client(client, "us-east-1"));
    let receipt = uploader
        .upload_from_file("reports", "q1.pdf", file.path(), None, PublicAccess::None, None)
        .await
        .unwrap();

    assert_eq!(put.num_calls(), 1);
    assert_eq!(receipt.size_bytes, 9);
}
