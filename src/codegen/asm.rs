//! FASM-flavoured instruction representation: the full 16-register,
//! four-width register file this language's codegen needs, plus the
//! instruction set its operators lower to.

use std::fmt;

/// One of the 16 general-purpose registers, width-independent. Paired with
/// an [`InstructionSize`] (via [`Reg::name`]) to get the concrete assembly
/// spelling. Indexed identically across widths: 0=a, 1=b, 2=c, 3=d, 4=si,
/// 5=di, 6=sp, 7=bp, 8..15=r8..r15.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reg {
    A,
    B,
    C,
    D,
    Si,
    Di,
    Sp,
    Bp,
    R8,
    R9,
    R10,
    R11,
    R12,
    R13,
    R14,
    R15,
}

impl Reg {
    pub const COUNT: usize = 16;

    /// Register by index, in the register table's canonical order.
    pub fn by_index(idx: usize) -> Reg {
        const ORDER: [Reg; 16] = [
            Reg::A,
            Reg::B,
            Reg::C,
            Reg::D,
            Reg::Si,
            Reg::Di,
            Reg::Sp,
            Reg::Bp,
            Reg::R8,
            Reg::R9,
            Reg::R10,
            Reg::R11,
            Reg::R12,
            Reg::R13,
            Reg::R14,
            Reg::R15,
        ];
        ORDER[idx % ORDER.len()]
    }

    pub fn name(self, size: InstructionSize) -> &'static str {
        use InstructionSize::*;
        use Reg::*;
        match (self, size) {
            (A, Qword) => "rax",
            (A, Dword) => "eax",
            (A, Word) => "ax",
            (A, Byte) => "al",
            (B, Qword) => "rbx",
            (B, Dword) => "ebx",
            (B, Word) => "bx",
            (B, Byte) => "bl",
            (C, Qword) => "rcx",
            (C, Dword) => "ecx",
            (C, Word) => "cx",
            (C, Byte) => "cl",
            (D, Qword) => "rdx",
            (D, Dword) => "edx",
            (D, Word) => "dx",
            (D, Byte) => "dl",
            (Si, Qword) => "rsi",
            (Si, Dword) => "esi",
            (Si, Word) => "si",
            (Si, Byte) => "sil",
            (Di, Qword) => "rdi",
            (Di, Dword) => "edi",
            (Di, Word) => "di",
            (Di, Byte) => "dil",
            (Sp, Qword) => "rsp",
            (Sp, Dword) => "esp",
            (Sp, Word) => "sp",
            (Sp, Byte) => "spl",
            (Bp, Qword) => "rbp",
            (Bp, Dword) => "ebp",
            (Bp, Word) => "bp",
            (Bp, Byte) => "bpl",
            (R8, Qword) => "r8",
            (R8, Dword) => "r8d",
            (R8, Word) => "r8w",
            (R8, Byte) => "r8b",
            (R9, Qword) => "r9",
            (R9, Dword) => "r9d",
            (R9, Word) => "r9w",
            (R9, Byte) => "r9b",
            (R10, Qword) => "r10",
            (R10, Dword) => "r10d",
            (R10, Word) => "r10w",
            (R10, Byte) => "r10b",
            (R11, Qword) => "r11",
            (R11, Dword) => "r11d",
            (R11, Word) => "r11w",
            (R11, Byte) => "r11b",
            (R12, Qword) => "r12",
            (R12, Dword) => "r12d",
            (R12, Word) => "r12w",
            (R12, Byte) => "r12b",
            (R13, Qword) => "r13",
            (R13, Dword) => "r13d",
            (R13, Word) => "r13w",
            (R13, Byte) => "r13b",
            (R14, Qword) => "r14",
            (R14, Dword) => "r14d",
            (R14, Word) => "r14w",
            (R14, Byte) => "r14b",
            (R15, Qword) => "r15",
            (R15, Dword) => "r15d",
            (R15, Word) => "r15w",
            (R15, Byte) => "r15b",
            (_, InstructionSize::None) => "",
        }
    }
}

/// Word size prefix used in FASM/NASM memory operands, and the byte width
/// it stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionSize {
    None,
    Byte,
    Word,
    Dword,
    Qword,
}

impl InstructionSize {
    pub fn bytes(self) -> usize {
        match self {
            InstructionSize::None => 0,
            InstructionSize::Byte => 1,
            InstructionSize::Word => 2,
            InstructionSize::Dword => 4,
            InstructionSize::Qword => 8,
        }
    }

    /// The smallest size that can hold `bytes`, used when chunking compound
    /// literal data for inline stack materialisation.
    pub fn largest_fitting(bytes: usize) -> InstructionSize {
        if bytes >= 8 {
            InstructionSize::Qword
        } else if bytes >= 4 {
            InstructionSize::Dword
        } else if bytes >= 2 {
            InstructionSize::Word
        } else {
            InstructionSize::Byte
        }
    }
}

impl fmt::Display for InstructionSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InstructionSize::None => "",
            InstructionSize::Byte => "byte",
            InstructionSize::Word => "word",
            InstructionSize::Dword => "dword",
            InstructionSize::Qword => "qword",
        })
    }
}

#[derive(Debug, Clone)]
pub enum Operand {
    Reg(Reg, InstructionSize),
    Imm(i64),
    /// A `[rbp - offset]` memory reference, sized for the access.
    Stack(InstructionSize, usize),
    /// A `[base + index]` memory reference — used only to address into a
    /// materialised string's byte data for indexing.
    IndexedMem(InstructionSize, Reg, Reg),
    Label(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Reg(reg, size) => f.write_str(reg.name(*size)),
            Operand::Imm(value) => write!(f, "{value}"),
            Operand::Stack(size, offset) => write!(f, "{size} [rbp - {offset}]"),
            Operand::IndexedMem(size, base, index) => {
                write!(f, "{size} [{} + {}]", base.name(InstructionSize::Qword), index.name(InstructionSize::Qword))
            }
            Operand::Label(label) => f.write_str(label),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Instruction {
    Comment(String),
    Label(String),
    Section(&'static str),
    Lea(Operand, Operand),
    Mov(Operand, Operand),
    Add(Operand, Operand),
    Sub(Operand, Operand),
    Imul(Operand, Operand),
    Idiv(Operand),
    Cqo,
    Cdq,
    Cwd,
    Cbw,
    Neg(Operand),
    Not(Operand),
    And(Operand, Operand),
    Or(Operand, Operand),
    Xor(Operand, Operand),
    Test(Operand, Operand),
    Cmp(Operand, Operand),
    Sete(Operand),
    Setne(Operand),
    Setg(Operand),
    Setl(Operand),
    Setge(Operand),
    Setle(Operand),
    Inc(Operand),
    Dec(Operand),
    Shl(Operand, Operand),
    Sar(Operand, Operand),
    Je(String),
    Jz(String),
    Jnz(String),
    Jmp(String),
    Call(String),
    Ret,
    Syscall,
    /// An already-formatted line, used sparingly for the few constructs
    /// (section headers, raw data bytes) that don't earn their own variant.
    Raw(String),
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = match self {
            Instruction::Comment(text) => format!("    ; {text}"),
            Instruction::Label(label) => format!("{label}:"),
            Instruction::Section(name) => format!("segment {name}"),
            Instruction::Lea(dst, src) => format!("    lea {dst}, [{src}]", src = strip_brackets(src)),
            Instruction::Mov(dst, src) => format!("    mov {dst}, {src}"),
            Instruction::Add(dst, src) => format!("    add {dst}, {src}"),
            Instruction::Sub(dst, src) => format!("    sub {dst}, {src}"),
            Instruction::Imul(dst, src) => format!("    imul {dst}, {src}"),
            Instruction::Idiv(src) => format!("    idiv {src}"),
            Instruction::Cqo => "    cqo".to_string(),
            Instruction::Cdq => "    cdq".to_string(),
            Instruction::Cwd => "    cwd".to_string(),
            Instruction::Cbw => "    cbw".to_string(),
            Instruction::Neg(dst) => format!("    neg {dst}"),
            Instruction::Not(dst) => format!("    not {dst}"),
            Instruction::And(dst, src) => format!("    and {dst}, {src}"),
            Instruction::Or(dst, src) => format!("    or {dst}, {src}"),
            Instruction::Xor(dst, src) => format!("    xor {dst}, {src}"),
            Instruction::Test(a, b) => format!("    test {a}, {b}"),
            Instruction::Cmp(a, b) => format!("    cmp {a}, {b}"),
            Instruction::Sete(dst) => format!("    sete {dst}"),
            Instruction::Setne(dst) => format!("    setne {dst}"),
            Instruction::Setg(dst) => format!("    setg {dst}"),
            Instruction::Setl(dst) => format!("    setl {dst}"),
            Instruction::Setge(dst) => format!("    setge {dst}"),
            Instruction::Setle(dst) => format!("    setle {dst}"),
            Instruction::Inc(dst) => format!("    inc {dst}"),
            Instruction::Dec(dst) => format!("    dec {dst}"),
            Instruction::Shl(dst, count) => format!("    shl {dst}, {count}"),
            Instruction::Sar(dst, count) => format!("    sar {dst}, {count}"),
            Instruction::Je(label) => format!("    je {label}"),
            Instruction::Jz(label) => format!("    jz {label}"),
            Instruction::Jnz(label) => format!("    jnz {label}"),
            Instruction::Jmp(label) => format!("    jmp {label}"),
            Instruction::Call(label) => format!("    call {label}"),
            Instruction::Ret => "    ret".to_string(),
            Instruction::Syscall => "    syscall".to_string(),
            Instruction::Raw(text) => text.clone(),
        };
        f.write_str(&line)
    }
}

/// [`Instruction::Lea`] takes a pre-built `[...]` memory operand; this
/// un-wraps a `Stack` operand's own brackets so it isn't doubled up.
fn strip_brackets(operand: &Operand) -> String {
    match operand {
        Operand::Stack(_, offset) => format!("rbp - {offset}"),
        other => other.to_string(),
    }
}
