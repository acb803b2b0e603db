#![allow(dead_code)]

use pollftpd::core_fs::{EntryStat, WriteMode};
use pollftpd::{
    Clock, CredentialTable, Filesystem, FtpServer, LocalFilesystem, SessionConfig, StdSocketPool,
    SystemClock,
};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{Ipv4Addr, SocketAddrV4, TcpStream};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// [`LocalFilesystem`] that counts the calls made through it.
pub struct CountingFs {
    inner: LocalFilesystem,
    calls: Arc<AtomicUsize>,
}

impl CountingFs {
    pub fn new(root: &Path) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let fs = CountingFs {
            inner: LocalFilesystem::new(root).unwrap(),
            calls: Arc::clone(&calls),
        };
        (fs, calls)
    }

    fn count(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl Filesystem for CountingFs {
    type Reader = File;
    type Writer = File;

    fn current_dir(&self) -> String {
        self.count();
        self.inner.current_dir()
    }

    fn change_dir(&mut self, path: &str) -> io::Result<()> {
        self.count();
        self.inner.change_dir(path)
    }

    fn reset_dir(&mut self) {
        self.inner.reset_dir()
    }

    fn list_dir(&self, path: &str) -> io::Result<Vec<String>> {
        self.count();
        self.inner.list_dir(path)
    }

    fn stat(&self, path: &str) -> io::Result<EntryStat> {
        self.count();
        self.inner.stat(path)
    }

    fn make_dir(&mut self, path: &str) -> io::Result<()> {
        self.count();
        self.inner.make_dir(path)
    }

    fn remove_dir(&mut self, path: &str) -> io::Result<()> {
        self.count();
        self.inner.remove_dir(path)
    }

    fn remove_file(&mut self, path: &str) -> io::Result<()> {
        self.count();
        self.inner.remove_file(path)
    }

    fn rename(&mut self, from: &str, to: &str) -> io::Result<()> {
        self.count();
        self.inner.rename(from, to)
    }

    fn open_read(&mut self, path: &str) -> io::Result<File> {
        self.count();
        self.inner.open_read(path)
    }

    fn open_write(&mut self, path: &str, mode: WriteMode) -> io::Result<File> {
        self.count();
        self.inner.open_write(path, mode)
    }

    fn set_writable(&mut self, writable: bool) -> io::Result<()> {
        self.count();
        self.inner.set_writable(writable)
    }
}

pub type TestFtpServer<C> = FtpServer<StdSocketPool, CountingFs, C>;

/// Root directory with `a.txt` ("hello") and `music/song.mp3`.
pub fn populated_root() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.txt"), b"hello").unwrap();
    fs::create_dir(dir.path().join("music")).unwrap();
    fs::write(dir.path().join("music/song.mp3"), b"la la la").unwrap();
    dir
}

pub fn test_config(credentials: CredentialTable) -> SessionConfig {
    SessionConfig {
        bind: SocketAddrV4::new(Ipv4Addr::LOCALHOST, 0),
        pasv_port: 0,
        max_cache: 2,
        max_buffer: 512,
        transfer_chunk: 300,
        credentials,
        ..Default::default()
    }
}

/// A server polled from a background thread.
pub struct TestServer<C: Clock + Send + 'static> {
    pub addr: SocketAddrV4,
    pub fs_calls: Arc<AtomicUsize>,
    disconnects: Arc<AtomicUsize>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<TestFtpServer<C>>>,
}

impl TestServer<SystemClock> {
    pub fn start(root: &Path, config: SessionConfig) -> Self {
        Self::start_with_clock(root, config, SystemClock::new())
    }
}

impl<C: Clock + Send + 'static> TestServer<C> {
    pub fn start_with_clock(root: &Path, config: SessionConfig, clock: C) -> Self {
        let (fs, fs_calls) = CountingFs::new(root);
        let mut server = FtpServer::with_parts(StdSocketPool, fs, clock, config).unwrap();
        let addr = server.local_addr().unwrap();
        fs_calls.store(0, Ordering::SeqCst);

        let stop = Arc::new(AtomicBool::new(false));
        let disconnects = Arc::new(AtomicUsize::new(0));
        let handle = {
            let stop = Arc::clone(&stop);
            let disconnects = Arc::clone(&disconnects);
            thread::spawn(move || {
                while !stop.load(Ordering::SeqCst) {
                    if server.poll() {
                        disconnects.fetch_add(1, Ordering::SeqCst);
                    }
                    thread::sleep(Duration::from_millis(1));
                }
                server
            })
        };

        TestServer {
            addr,
            fs_calls,
            disconnects,
            stop,
            handle: Some(handle),
        }
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn fs_calls(&self) -> usize {
        self.fs_calls.load(Ordering::SeqCst)
    }

    /// Waits until `check` holds or panics after a few seconds.
    pub fn wait_for(&self, what: &str, check: impl Fn(&Self) -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !check(self) {
            assert!(Instant::now() < deadline, "timed out waiting for {}", what);
            thread::sleep(Duration::from_millis(5));
        }
    }

    /// Stops polling and hands the server back.
    pub fn stop(mut self) -> TestFtpServer<C> {
        self.stop.store(true, Ordering::SeqCst);
        self.handle.take().unwrap().join().unwrap()
    }
}

impl<C: Clock + Send + 'static> Drop for TestServer<C> {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Blocking FTP client speaking just enough of the protocol for the tests.
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Client {
    pub fn connect(addr: SocketAddrV4) -> Self {
        let stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        Client {
            reader: BufReader::new(stream.try_clone().unwrap()),
            writer: stream,
        }
    }

    /// Connects and consumes the welcome line.
    pub fn login(addr: SocketAddrV4) -> Self {
        let mut client = Self::connect(addr);
        assert_eq!(client.read_line(), "220 Welcome!");
        client
    }

    /// Next reply line without CRLF; empty once the server hung up.
    pub fn read_line(&mut self) -> String {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(_) => line.trim_end_matches(['\r', '\n']).to_string(),
            Err(_) => String::new(),
        }
    }

    pub fn send(&mut self, command: &str) {
        self.writer
            .write_all(format!("{}\r\n", command).as_bytes())
            .unwrap();
    }

    pub fn send_raw(&mut self, data: &[u8]) {
        self.writer.write_all(data).unwrap();
    }

    pub fn cmd(&mut self, command: &str) -> String {
        self.send(command);
        self.read_line()
    }

    /// Sends PASV and connects to the advertised endpoint.
    pub fn pasv(&mut self) -> TcpStream {
        self.send("PASV");
        let reply = self.read_line();
        let addr = parse_pasv_reply(&reply);
        let data = TcpStream::connect(addr).unwrap();
        data.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        data
    }

    /// True once the server closed the control connection.
    pub fn is_closed(&mut self) -> bool {
        let mut buf = [0u8; 1];
        matches!(self.reader.read(&mut buf), Ok(0))
    }
}

pub fn parse_pasv_reply(reply: &str) -> SocketAddrV4 {
    let inner = reply
        .strip_prefix("227 Entering Passive Mode (")
        .and_then(|rest| rest.strip_suffix(")."))
        .unwrap_or_else(|| panic!("not a PASV reply: {:?}", reply));
    let fields: Vec<u8> = inner.split(',').map(|f| f.parse().unwrap()).collect();
    assert_eq!(fields.len(), 6);
    SocketAddrV4::new(
        Ipv4Addr::new(fields[0], fields[1], fields[2], fields[3]),
        u16::from(fields[4]) * 256 + u16::from(fields[5]),
    )
}

pub fn read_all(mut stream: TcpStream) -> Vec<u8> {
    let mut data = Vec::new();
    stream.read_to_end(&mut data).unwrap();
    data
}
