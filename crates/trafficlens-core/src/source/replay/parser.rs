use std::fs::File;
use std::path::Path;

use pcap_parser::{
    Block, LegacyPcapReader, PcapBlockOwned, PcapError, PcapNGReader,
    traits::PcapReaderIterator,
};

use crate::source::{Frame, FrameEvent, FrameSource, SourceError};

use super::layout;
use super::reader::{CaptureFormat, InterfaceClock, interface_clock, sniff_format};

/// Frame source reading a `.pcap` or `.pcapng` file front to back.
pub struct PcapFileSource {
    inner: PcapReader,
}

enum PcapReader {
    Legacy {
        reader: LegacyPcapReader<File>,
        clock: InterfaceClock,
    },
    Ng {
        reader: PcapNGReader<File>,
        interfaces: Vec<InterfaceClock>,
    },
}

impl PcapFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        let inner = create_reader(file)?;
        Ok(Self { inner })
    }
}

impl FrameSource for PcapFileSource {
    fn next_frame(&mut self) -> Result<FrameEvent, SourceError> {
        match next_frame(&mut self.inner)? {
            Some(frame) => Ok(FrameEvent::Frame(frame)),
            None => Ok(FrameEvent::Exhausted),
        }
    }
}

fn create_reader(mut file: File) -> Result<PcapReader, SourceError> {
    match sniff_format(&mut file)? {
        CaptureFormat::PcapNg => {
            let reader = PcapNGReader::new(layout::PCAP_READER_BUFFER_SIZE, file).map_err(|e| {
                SourceError::Pcap {
                    context: "pcapng",
                    message: e.to_string(),
                }
            })?;
            Ok(PcapReader::Ng {
                reader,
                interfaces: Vec::new(),
            })
        }
        CaptureFormat::Legacy => {
            let reader =
                LegacyPcapReader::new(layout::PCAP_READER_BUFFER_SIZE, file).map_err(|e| {
                    SourceError::Pcap {
                        context: "pcap",
                        message: e.to_string(),
                    }
                })?;
            Ok(PcapReader::Legacy {
                reader,
                clock: InterfaceClock::default(),
            })
        }
    }
}

fn next_frame(reader: &mut PcapReader) -> Result<Option<Frame>, SourceError> {
    match reader {
        PcapReader::Legacy { reader, clock } => advance(reader, "pcap", |block| match block {
            PcapBlockOwned::LegacyHeader(header) => {
                *clock = InterfaceClock::legacy(header.network, header.is_nanosecond_precision());
                None
            }
            PcapBlockOwned::Legacy(packet) => Some(Frame {
                timestamp: clock
                    .rate
                    .instant(i64::from(packet.ts_sec), u64::from(packet.ts_usec)),
                linktype: clock.linktype,
                data: packet.data.to_vec(),
            }),
            _ => None,
        }),
        PcapReader::Ng { reader, interfaces } => advance(reader, "pcapng", |block| match block {
            PcapBlockOwned::NG(Block::InterfaceDescription(intf)) => {
                interfaces.push(InterfaceClock::pcapng(
                    intf.linktype,
                    intf.if_tsresol,
                    intf.if_tsoffset,
                ));
                None
            }
            PcapBlockOwned::NG(Block::EnhancedPacket(packet)) => {
                let clock = interface_clock(interfaces, packet.if_id);
                Some(Frame {
                    timestamp: clock.rate.instant_from_counter(
                        packet.ts_high,
                        packet.ts_low,
                        clock.offset_seconds,
                    ),
                    linktype: clock.linktype,
                    data: packet.data.to_vec(),
                })
            }
            _ => None,
        }),
    }
}

/// Pull blocks until one of them yields a frame or the file ends.
fn advance<R, F>(
    reader: &mut R,
    context: &'static str,
    mut on_block: F,
) -> Result<Option<Frame>, SourceError>
where
    R: PcapReaderIterator,
    F: FnMut(PcapBlockOwned<'_>) -> Option<Frame>,
{
    loop {
        match reader.next() {
            Ok((offset, block)) => {
                let frame = on_block(block);
                reader.consume(offset);
                if frame.is_some() {
                    return Ok(frame);
                }
            }
            Err(PcapError::Eof) => return Ok(None),
            Err(PcapError::Incomplete(_)) => {
                reader.refill().map_err(|e| SourceError::Pcap {
                    context,
                    message: format!("refill failed: {e}"),
                })?;
            }
            Err(e) => {
                return Err(SourceError::Pcap {
                    context,
                    message: e.to_string(),
                });
            }
        }
    }
}
