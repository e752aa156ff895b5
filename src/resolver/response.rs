//! Response construction helpers

use std::net::Ipv4Addr;

use hickory_proto::op::{Header, Message, ResponseCode};
use hickory_proto::rr::rdata::{A, PTR};
use hickory_proto::rr::{DNSClass, Name, RData, Record};

/// Empty reply to `request`: same id, opcode, flags and question section
pub fn reply_to(request: &Message) -> Message {
    let mut response = Message::new();
    response.set_header(Header::response_from_request(request.header()));
    for query in request.queries() {
        response.add_query(query.clone());
    }
    response
}

/// SERVFAIL reply to `request`
pub fn servfail(request: &Message) -> Message {
    let mut response = reply_to(request);
    response.set_response_code(ResponseCode::ServFail);
    response
}

/// Address record in class IN
pub fn a_record(name: &Name, ip: Ipv4Addr, ttl: u32) -> Record {
    let mut record = Record::from_rdata(name.clone(), ttl, RData::A(A(ip)));
    record.set_dns_class(DNSClass::IN);
    record
}

/// Pointer record in class IN
pub fn ptr_record(name: &Name, target: &Name, ttl: u32) -> Record {
    let mut record = Record::from_rdata(name.clone(), ttl, RData::PTR(PTR(target.clone())));
    record.set_dns_class(DNSClass::IN);
    record
}
