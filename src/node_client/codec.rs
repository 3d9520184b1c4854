use bytes::{Buf, BufMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use tonic::codec::{Codec, DecodeBuf, Decoder, EncodeBuf, Encoder};
use tonic::Status;

/// gRPC codec carrying CBOR instead of protobuf messages, which is what the
/// node speaks on its gRPC socket.
pub struct CborCodec<T, U>(PhantomData<(T, U)>);

impl<T, U> Default for CborCodec<T, U> {
    fn default() -> Self {
        CborCodec(PhantomData)
    }
}

impl<T, U> Codec for CborCodec<T, U>
where
    T: Serialize + Send + 'static,
    U: DeserializeOwned + Send + 'static,
{
    type Encode = T;
    type Decode = U;
    type Encoder = CborEncoder<T>;
    type Decoder = CborDecoder<U>;

    fn encoder(&mut self) -> Self::Encoder {
        CborEncoder(PhantomData)
    }

    fn decoder(&mut self) -> Self::Decoder {
        CborDecoder(PhantomData)
    }
}

pub struct CborEncoder<T>(PhantomData<T>);

impl<T: Serialize> Encoder for CborEncoder<T> {
    type Item = T;
    type Error = Status;

    fn encode(&mut self, item: Self::Item, dst: &mut EncodeBuf<'_>) -> Result<(), Self::Error> {
        serde_cbor::to_writer(dst.writer(), &item)
            .map_err(|e| Status::internal(format!("CBOR encode failed: {}", e)))
    }
}

pub struct CborDecoder<U>(PhantomData<U>);

impl<U: DeserializeOwned> Decoder for CborDecoder<U> {
    type Item = U;
    type Error = Status;

    fn decode(&mut self, src: &mut DecodeBuf<'_>) -> Result<Option<Self::Item>, Self::Error> {
        let raw = src.copy_to_bytes(src.remaining());
        serde_cbor::from_slice(&raw)
            .map(Some)
            .map_err(|e| Status::internal(format!("CBOR decode failed: {}", e)))
    }
}
